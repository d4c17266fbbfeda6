//! Feed fixtures

/// RSS 2.0 feed with a channel header and two items
pub const RSS_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
    <channel>
        <title>Example Feed</title>
        <link>https://example.com</link>
        <description>Weekly &amp; daily updates</description>
        <item>
            <title>First episode</title>
            <link>https://example.com/1</link>
            <description>Pilot &ndash; part one</description>
            <image>https://example.com/1.png</image>
        </item>
        <item>
            <title>Second episode</title>
            <link>https://example.com/2</link>
            <description><![CDATA[<p>Finale</p>]]></description>
        </item>
    </channel>
</rss>"#;

/// The two-item document from the crate documentation
pub const ITEMS_XML: &str = "<items><item><title>A</title><link>L1</link></item>\
<item><title>B</title><link>L2</link></item></items>";

/// Ends inside an end tag
pub const TRUNCATED_XML: &str = "<items><item><title>A</title";

/// Build a feed with `count` items whose titles and links carry `tag`
pub fn numbered_feed(tag: &str, count: usize) -> String {
    let mut xml = String::from("<rss><channel>");
    for i in 0..count {
        xml.push_str(&format!(
            "<item><title>{tag}-{i}</title><link>https://{tag}.test/{i}</link></item>"
        ));
    }
    xml.push_str("</channel></rss>");
    xml
}

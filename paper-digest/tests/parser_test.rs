mod common;

use common::init_tracing;
use paper_digest::FeedParser;

const ATOM_RESPONSE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <title type="html">ArXiv Query: search_query=cat:cs.CL</title>
  <id>http://arxiv.org/api/cHxbiOdZaP56ODnBPIenZhzg5f8</id>
  <updated>2024-01-15T00:00:00-05:00</updated>
  <entry>
    <id>http://arxiv.org/abs/2401.12345v1</id>
    <updated>2024-01-14T18:00:00Z</updated>
    <published>2024-01-14T18:00:00Z</published>
    <title>Attention Is
      All You Need</title>
    <summary>  We propose a new
  architecture.  </summary>
    <author><name>Ada Lovelace</name></author>
    <author><name>Alan Turing</name></author>
    <link href="http://arxiv.org/abs/2401.12345v1" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2401.12345v1" rel="related" type="application/pdf"/>
    <arxiv:primary_category term="cs.CL" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.CL" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.LG" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2401.12345v2</id>
    <updated>2024-01-15T09:00:00Z</updated>
    <published>2024-01-14T18:00:00Z</published>
    <title>Attention Is All You Need (revised)</title>
    <summary>Revised.</summary>
    <author><name>Ada Lovelace</name></author>
    <link href="http://arxiv.org/abs/2401.12345v2" rel="alternate" type="text/html"/>
    <category term="cs.CL" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
  <entry>
    <id>http://arxiv.org/api/errors#incorrect_id_format_for_1234</id>
    <title>Error</title>
    <summary>incorrect id format for 1234</summary>
    <updated>2024-01-15T00:00:00-05:00</updated>
    <link href="http://arxiv.org/api/errors#incorrect_id_format_for_1234" rel="alternate" type="text/html"/>
    <author><name>arXiv api core</name></author>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/hep-th/9901001v3</id>
    <updated>1999-01-02T00:00:00Z</updated>
    <published>1999-01-01T00:00:00Z</published>
    <title>Strings Old Style</title>
    <summary>Old identifiers keep their archive prefix.</summary>
    <author><name>Max Planck</name></author>
    <link href="http://arxiv.org/abs/hep-th/9901001v3" rel="alternate" type="text/html"/>
    <category term="hep-th" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
</feed>
"#;

#[test]
fn parses_catalog_entries() {
    init_tracing();
    let papers = FeedParser::new().parse_feed(ATOM_RESPONSE).unwrap();

    let ids: Vec<&str> = papers.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["2401.12345", "hep-th/9901001"]);

    let first = &papers[0];
    assert_eq!(first.title, "Attention Is All You Need");
    assert_eq!(first.abstract_text, "We propose a new architecture.");
    assert_eq!(first.authors, vec!["Ada Lovelace", "Alan Turing"]);
    assert!(first.categories.starts_with(&["cs.CL".to_string()]));
    assert!(first.categories.contains(&"cs.LG".to_string()));
    assert_eq!(first.published, "2024-01-14T18:00:00Z");
    assert_eq!(first.source_url, "http://arxiv.org/abs/2401.12345v1");
    assert_eq!(first.artifact_url, "http://arxiv.org/pdf/2401.12345v1.pdf");

    let old = &papers[1];
    assert_eq!(old.artifact_url, "http://arxiv.org/pdf/hep-th/9901001v3.pdf");
}

#[test]
fn dedup_cache_can_be_cleared() {
    let mut parser = FeedParser::new();
    assert_eq!(parser.parse_feed(ATOM_RESPONSE).unwrap().len(), 2);
    assert!(parser.parse_feed(ATOM_RESPONSE).unwrap().is_empty());

    parser.clear_deduplication_cache();
    assert_eq!(parser.parse_feed(ATOM_RESPONSE).unwrap().len(), 2);
}

#[test]
fn rejects_non_feed_content() {
    assert!(FeedParser::new().parse_feed("<html><body>Rate limited</body></html>").is_err());
}

#[test]
fn serializes_with_agent_field_names() {
    let papers = FeedParser::new().parse_feed(ATOM_RESPONSE).unwrap();
    let json = serde_json::to_value(&papers[0]).unwrap();
    assert_eq!(json["arxiv_id"], "2401.12345");
    assert_eq!(json["abstract"], "We propose a new architecture.");
    assert_eq!(json["arxiv_url"], "http://arxiv.org/abs/2401.12345v1");
    assert_eq!(json["pdf_url"], "http://arxiv.org/pdf/2401.12345v1.pdf");
}

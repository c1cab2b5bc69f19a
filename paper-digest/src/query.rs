use crate::config::InterestSpec;

/// Used when a spec somehow reaches the builder with nothing in it.
pub const FALLBACK_QUERY: &str = "cat:cs.LG";

/// Translates interests into the catalog's boolean search grammar.
///
/// Category tags become `cat:` terms. Each keyword is searched in both the
/// title (`ti:`) and the abstract (`abs:`); multi-word keywords are quoted so
/// the catalog matches them as a phrase. The category group and the keyword
/// group are ANDed when both exist.
pub struct QueryBuilder;

impl QueryBuilder {
    pub fn build(interests: &InterestSpec) -> String {
        Self::build_from_parts(interests.categories(), interests.keywords())
    }

    pub fn build_from_parts(categories: &[String], keywords: &[String]) -> String {
        let mut groups = Vec::new();

        if !categories.is_empty() {
            let terms: Vec<String> = categories.iter().map(|c| format!("cat:{}", c)).collect();
            groups.push(format!("({})", terms.join(" OR ")));
        }

        if !keywords.is_empty() {
            let mut terms = Vec::with_capacity(keywords.len() * 2);
            for keyword in keywords {
                let term = keyword_term(keyword);
                terms.push(format!("ti:{}", term));
                terms.push(format!("abs:{}", term));
            }
            groups.push(format!("({})", terms.join(" OR ")));
        }

        if groups.is_empty() {
            FALLBACK_QUERY.to_string()
        } else {
            groups.join(" AND ")
        }
    }
}

fn keyword_term(keyword: &str) -> String {
    if keyword.chars().any(char::is_whitespace) {
        format!("\"{}\"", keyword)
    } else {
        keyword.to_string()
    }
}

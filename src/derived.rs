// File: ./src/derived.rs
//! Basic pages aggregated from the current people.
use crate::model::patch::PAGE_STATUS;
use crate::model::{BasicPage, CountryTable, Person};
use crate::reader::PersonReader;
use std::collections::BTreeMap;

/// Slugs of the derived pages, P0 through P2.
pub const DERIVED_SLUGS: [&str; 3] = ["people_by_country", "people_by_affiliation", "people_by_id"];

const UNAFFILIATED: &str = "Unaffiliated";
const UNKNOWN_COUNTRY: &str = "Unknown";

pub fn is_derived(slug: &str) -> bool {
    DERIVED_SLUGS.contains(&slug)
}

fn affiliation(person: &Person) -> String {
    [&person.employer, &person.party]
        .into_iter()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .unwrap_or(UNAFFILIATED)
        .to_string()
}

/// Person fields are operator input; none of it may reach a page as markup.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn grouped_html(groups: BTreeMap<String, Vec<String>>) -> String {
    let mut html = String::new();
    for (heading, names) in groups {
        html.push_str(&format!("<h2>{}</h2><ul>", html_escape(&heading)));
        for name in names {
            html.push_str(&format!("<li>{}</li>", html_escape(&name)));
        }
        html.push_str("</ul>");
    }
    html
}

fn page(slug: &str, title: &str, content: String) -> BasicPage {
    BasicPage {
        slug: slug.to_string(),
        name: title.to_string(),
        title: title.to_string(),
        status: PAGE_STATUS[1].to_string(),
        content,
        ..Default::default()
    }
}

/// Builds P0 (by country), P1 (by affiliation) and P2 (by id), in that order.
pub fn derive_pages(people: &[Person], countries: &CountryTable) -> [BasicPage; 3] {
    let mut by_country: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut by_affiliation: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut by_id: Vec<(u64, String)> = Vec::new();

    for person in people {
        let reader = PersonReader::new(Some(person), countries);
        let name = reader.short_name();
        let country = match reader.country() {
            c if c.is_empty() => UNKNOWN_COUNTRY.to_string(),
            c => c,
        };
        by_country.entry(country).or_default().push(name.clone());
        by_affiliation
            .entry(affiliation(person))
            .or_default()
            .push(name.clone());
        by_id.push((person.id.unwrap_or_default(), name));
    }
    by_id.sort_by_key(|(id, _)| *id);

    let id_list = by_id
        .into_iter()
        .map(|(id, name)| format!("<li>#{} {}</li>", id, html_escape(&name)))
        .collect::<String>();

    [
        page(DERIVED_SLUGS[0], "People by Country", grouped_html(by_country)),
        page(
            DERIVED_SLUGS[1],
            "People by Affiliation",
            grouped_html(by_affiliation),
        ),
        page(DERIVED_SLUGS[2], "People by ID", format!("<ul>{}</ul>", id_list)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(id: u64, first: &str, last: &str, employer: &str, party: &str, cc: &str) -> Person {
        let mut p = Person {
            id: Some(id),
            first_name: first.to_string(),
            last_name: last.to_string(),
            employer: employer.to_string(),
            party: party.to_string(),
            ..Default::default()
        };
        p.registered_address.country_code = cc.to_string();
        p
    }

    #[test]
    fn test_affiliation_fallbacks() {
        let people = vec![
            person(1, "Ada", "Lovelace", "Analytical Engines", "I", "US"),
            person(2, "Grace", "Hopper", "", "D", "US"),
            person(3, "Alan", "Turing", "", "", "GB"),
        ];
        let [_, by_aff, _] = derive_pages(&people, &CountryTable::default());
        assert!(by_aff.content.contains("<h2>Analytical Engines</h2><ul><li>Ada L.</li></ul>"));
        assert!(by_aff.content.contains("<h2>D</h2><ul><li>Grace H.</li></ul>"));
        assert!(by_aff.content.contains("<h2>Unaffiliated</h2><ul><li>Alan T.</li></ul>"));
    }

    #[test]
    fn test_country_names_from_table() {
        let mut entries = BTreeMap::new();
        entries.insert("US".to_string(), "United States".to_string());
        let countries = CountryTable::from_map(&entries);
        let people = vec![
            person(1, "Ada", "Lovelace", "", "", "us"),
            person(2, "Alan", "Turing", "", "", "gb"),
        ];
        let [by_country, _, by_id] = derive_pages(&people, &countries);
        assert!(by_country.content.contains("<h2>United States</h2>"));
        assert!(by_country.content.contains("<h2>GB</h2>"));
        assert_eq!(by_id.content, "<ul><li>#1 Ada L.</li><li>#2 Alan T.</li></ul>");
        assert_eq!(by_id.status, "published");
    }

    #[test]
    fn test_names_and_groups_are_escaped() {
        let people = vec![
            person(1, "<script>x</script>", "O'Neil", "Smith & \"Sons\"", "", "US"),
        ];
        let [_, by_aff, by_id] = derive_pages(&people, &CountryTable::default());
        assert_eq!(by_id.content, "<ul><li>#1 &lt;script&gt;x&lt;/script&gt; O.</li></ul>");
        assert!(by_aff.content.contains("<h2>Smith &amp; &quot;Sons&quot;</h2>"));
        assert!(!by_aff.content.contains("<script>"));
        assert_eq!(html_escape("it's"), "it&#39;s");
    }
}

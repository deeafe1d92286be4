use scraper::{Html, Selector};
use serde_json::Value;

use crate::domain::listing::{Listing, PageResult};

const AD_CONTAINER: &str = "article.classified";
const STRUCTURED_DATA: &str = r#"script[type="application/ld+json"]"#;

/// The site emits structured data in pairs; only the first block of each
/// pair holds the listing array.
const STRUCTURED_DATA_STEP: usize = 2;

/// Parses one results page.
///
/// An empty page (no ad containers) yields no listings even when structured
/// data is present, since that is what ends pagination.
pub fn extract_listings(html_content: &str, page_number: u32) -> PageResult {
    let html_document = Html::parse_document(html_content);

    let container_selector = Selector::parse(AD_CONTAINER).unwrap();
    let script_selector = Selector::parse(STRUCTURED_DATA).unwrap();

    let container_count = html_document.select(&container_selector).count();
    if container_count == 0 {
        return PageResult {
            page_number,
            container_count,
            listings: vec![],
        };
    }

    let mut listings = vec![];
    for (i, script) in html_document
        .select(&script_selector)
        .enumerate()
        .step_by(STRUCTURED_DATA_STEP)
    {
        let raw: String = script.text().collect();
        let parsed = match serde_json::from_str::<Value>(&raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("Skipping unparsable structured data block {}: {}", i, e);
                continue;
            }
        };

        let Some(objects) = parsed.as_array() else {
            log::warn!("Failed to index structured data block {} on page {}", i, page_number);
            continue;
        };

        listings.extend(objects.iter().filter_map(listing_from_json));
    }

    log::debug!(
        "Page {} has {} ads and {} structured listings",
        page_number,
        container_count,
        listings.len()
    );

    PageResult {
        page_number,
        container_count,
        listings,
    }
}

/// Objects missing any of the required fields are skipped.
fn listing_from_json(object: &Value) -> Option<Listing> {
    Some(Listing {
        image_url: image_field(object.get("image")?)?,
        title: object.get("name")?.as_str()?.trim().to_string(),
        detail_url: object.get("url")?.as_str()?.to_string(),
        production_date: scalar_field(object.get("productionDate")?)?,
    })
}

fn image_field(value: &Value) -> Option<String> {
    match value {
        Value::Array(images) => images.iter().find_map(|v| v.as_str().map(str::to_string)),
        other => scalar_field(other),
    }
}

fn scalar_field(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use scraper::Selector;

    use super::{extract_listings, AD_CONTAINER, STRUCTURED_DATA};

    fn page(containers: usize, blocks: &[&str]) -> String {
        let articles = "<article class=\"classified\"></article>".repeat(containers);
        let scripts: String = blocks
            .iter()
            .map(|b| format!("<script type=\"application/ld+json\">{}</script>", b))
            .collect();
        format!("<html><head>{}</head><body>{}</body></html>", scripts, articles)
    }

    fn ad(name: &str, url: &str) -> String {
        format!(
            r#"{{"image": "https://img.example/{name}.jpg", "name": " {name} ", "url": "{url}", "productionDate": "2019"}}"#
        )
    }

    #[test]
    fn extracts_listings_from_even_blocks() {
        let first = format!("[{}, {}]", ad("X", "https://e.com/x"), ad("Y", "https://e.com/y"));
        let second = format!("[{}]", ad("Ignored", "https://e.com/ignored"));
        let third = format!("[{}]", ad("Z", "https://e.com/z"));
        let html = page(3, &[&first, &second, &third]);

        let result = extract_listings(&html, 1);

        let titles: Vec<&str> = result.listings.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["X", "Y", "Z"]);
        assert_eq!(result.container_count, 3);
        assert_eq!(result.listings[0].image_url, "https://img.example/X.jpg");
        assert_eq!(result.listings[0].production_date, "2019");
    }

    #[test]
    fn no_containers_means_empty_page() {
        let block = format!("[{}]", ad("X", "https://e.com/x"));
        let result = extract_listings(&page(0, &[&block]), 4);

        assert!(result.is_empty());
        assert!(result.listings.is_empty());
        assert_eq!(result.page_number, 4);
    }

    #[test]
    fn incomplete_objects_are_skipped() {
        let block = format!(
            r#"[{{"name": "No url", "image": "i", "productionDate": "2020"}}, {}]"#,
            ad("Ok", "https://e.com/ok")
        );
        let result = extract_listings(&page(2, &[&block]), 1);

        assert_eq!(result.listings.len(), 1);
        assert_eq!(result.listings[0].title, "Ok");
    }

    #[test]
    fn malformed_blocks_are_skipped() {
        let good = format!("[{}]", ad("Ok", "https://e.com/ok"));
        let html = page(1, &["{not json", "[]", r#"{"@type": "Car"}"#, "[]", &good]);

        let result = extract_listings(&html, 1);

        assert_eq!(result.listings.len(), 1);
        assert_eq!(result.listings[0].detail_url, "https://e.com/ok");
    }

    #[test]
    fn numeric_date_and_image_list_are_accepted() {
        let block = r#"[{"image": ["https://img/a.jpg", "https://img/b.jpg"], "name": "A", "url": "https://e.com/a", "productionDate": 2015}]"#;
        let result = extract_listings(&page(1, &[block]), 1);

        assert_eq!(result.listings[0].image_url, "https://img/a.jpg");
        assert_eq!(result.listings[0].production_date, "2015");
    }

    #[test]
    fn selectors_parse() {
        assert!(Selector::parse(AD_CONTAINER).is_ok());
        assert!(Selector::parse(STRUCTURED_DATA).is_ok());
    }
}

use trendscout_core::{CategoryConfig, Region};

use super::*;

fn us_source() -> RegionSource {
    RegionSource {
        region: Region::Us,
        base_url: "https://www.amazon.com/".to_string(),
        currency: None,
        categories: vec![CategoryConfig {
            name: "Home".to_string(),
            path: "/gp/bestsellers/home-garden/".to_string(),
        }],
    }
}

fn uk_source() -> RegionSource {
    RegionSource {
        region: Region::Uk,
        base_url: "https://www.amazon.co.uk".to_string(),
        currency: None,
        categories: vec![],
    }
}

fn grid_item(rank: Option<u32>, asin: &str, alt: &str, price: &str) -> String {
    let badge = rank
        .map(|r| format!(r#"<span class="zg-bdg-text">#{r}</span>"#))
        .unwrap_or_default();
    format!(
        r#"<div id="gridItemRoot" class="a-column">
             <div class="zg-bdg-ctr">{badge}</div>
             <a class="a-link-normal" href="/Some-Product/dp/{asin}/ref=zg_bs_g_home_d_sccl_1/123?psc=1">
               <img alt="{alt}" src="https://images.example.com/{asin}.jpg" />
             </a>
             <span class="_cDEzb_p13n-sc-price_3mJ9Z">{price}</span>
           </div>"#
    )
}

#[test]
fn parses_grid_items_in_page_order() {
    let html = format!(
        "<html><body>{}{}</body></html>",
        grid_item(Some(1), "B0AAAAAAA1", "Stainless Steel Water Bottle", "$24.99"),
        grid_item(Some(2), "B0AAAAAAA2", "LED Desk Lamp with USB Port", "$1,049.00"),
    );

    let listings = parse_bestseller_page(&html, &us_source(), "Home", 0);

    assert_eq!(listings.len(), 2);
    assert_eq!(listings[0].name, "Stainless Steel Water Bottle");
    assert_eq!(listings[0].category, "Home");
    assert_eq!(listings[0].url, "https://www.amazon.com/dp/B0AAAAAAA1");
    assert_eq!(listings[0].rank, Some(1));
    assert_eq!(listings[0].price, Some(24.99));
    assert_eq!(listings[1].price, Some(1049.0));
}

#[test]
fn rank_falls_back_to_position_with_offset() {
    let html = grid_item(None, "B0AAAAAAA3", "Silicone Baking Mat Set", "$12.00");
    let listings = parse_bestseller_page(&html, &us_source(), "Home", 30);
    assert_eq!(listings[0].rank, Some(31));
}

#[test]
fn missing_price_is_none() {
    let html = grid_item(Some(4), "B0AAAAAAA4", "Bamboo Cutting Board", "Currently unavailable");
    let listings = parse_bestseller_page(&html, &us_source(), "Home", 0);
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].price, None);
}

#[test]
fn short_or_missing_names_are_dropped() {
    let html = format!(
        "{}{}",
        grid_item(Some(1), "B0AAAAAAA5", "Mug", "$9.99"),
        grid_item(Some(2), "B0AAAAAAA6", "Ceramic Coffee Mug 12oz", "$9.99"),
    );
    let listings = parse_bestseller_page(&html, &us_source(), "Home", 0);
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].rank, Some(2));
}

#[test]
fn decodes_entities_in_names_and_prices() {
    let html = grid_item(
        Some(7),
        "B0AAAAAAA7",
        "Salt &amp; Pepper Grinder Set",
        "&pound;18.50",
    );
    let listings = parse_bestseller_page(&html, &uk_source(), "Home", 0);
    assert_eq!(listings[0].name, "Salt & Pepper Grinder Set");
    assert_eq!(listings[0].price, Some(18.5));
    assert_eq!(listings[0].url, "https://www.amazon.co.uk/dp/B0AAAAAAA7");
}

#[test]
fn price_in_other_currency_is_ignored() {
    let html = grid_item(Some(1), "B0AAAAAAA8", "Yoga Mat Non Slip", "$30.00");
    let listings = parse_bestseller_page(&html, &uk_source(), "Sports", 0);
    assert_eq!(listings[0].price, None);
}

#[test]
fn falls_back_to_title_div_without_alt() {
    let html = r#"<div id="gridItemRoot">
        <a href="/x/dp/B0AAAAAAA9"><div class="_cDEzb_p13n-sc-css-line-clamp-3_g3dy1">Electric
        Milk Frother</div></a></div>"#;
    let listings = parse_bestseller_page(html, &us_source(), "Home", 0);
    assert_eq!(listings[0].name, "Electric Milk Frother");
}

#[test]
fn link_fallback_dedupes_by_asin() {
    let html = r#"<ul>
        <li><a href="/a/dp/B0BBBBBBB1?ref=1"><span>Portable Blender Bottle</span></a></li>
        <li><a href="/a/dp/B0BBBBBBB1?ref=2">Portable Blender Bottle</a></li>
        <li><a href="https://www.amazon.com/b/dp/B0BBBBBBB2">Magnetic Phone Mount</a></li>
        <li><a href="/c/dp/B0BBBBBBB3">Go</a></li>
    </ul>"#;

    let listings = parse_bestseller_page(html, &us_source(), "Electronics", 0);

    assert_eq!(listings.len(), 2);
    assert_eq!(listings[0].name, "Portable Blender Bottle");
    assert_eq!(listings[0].rank, Some(1));
    assert_eq!(listings[1].url, "https://www.amazon.com/dp/B0BBBBBBB2");
    assert_eq!(listings[1].rank, Some(2));
    assert!(listings.iter().all(|l| l.price.is_none()));
}

#[test]
fn empty_page_yields_nothing() {
    assert!(parse_bestseller_page("<html></html>", &us_source(), "Home", 0).is_empty());
}

#[test]
fn long_names_are_truncated() {
    let long = "Very Long Product Title ".repeat(20);
    let html = grid_item(Some(1), "B0AAAAAAB1", &long, "$10.00");
    let listings = parse_bestseller_page(&html, &us_source(), "Home", 0);
    assert_eq!(listings[0].name.chars().count(), MAX_NAME_CHARS);
}

#[test]
fn decode_entities_handles_numeric_forms() {
    assert_eq!(decode_entities("&#163;5 &#x27;a&#39;"), "£5 'a'");
    assert_eq!(decode_entities("&amp;lt;"), "&lt;");
}

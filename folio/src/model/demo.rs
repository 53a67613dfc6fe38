use super::*;

const HERO_BG: &str =
    "https://images.unsplash.com/photo-1464822759023-fed622ff2c3b?q=80&w=3870&auto=format&fit=crop";

/// Timestamp stamped on every demo record.
const DEMO_TIMESTAMP: &str = "2026-01-20T09:00:00.000Z";

/// Built-in demo dataset, used whenever no usable local state exists.
/// Identical on every call.
pub fn demo_state() -> SiteState {
    let now = DEMO_TIMESTAMP.to_string();

    let pages = vec![
        Page {
            id: "index".into(),
            name: "Home (Index)".into(),
            slug: "index".into(),
            status: PageStatus::Draft,
            updated_at: now.clone(),
            layout: vec![Block::new("b_h1", "hero")
                .with_prop("subtitle", "Leading the transition")
                .with_prop("title", "From the ground<br>to the future.")
                .with_prop(
                    "desc",
                    "A family holding turning traditional mining into renewable energy and sustainable growth.",
                )
                .with_prop("bgImage", HERO_BG)],
        },
        Page {
            id: "sustainability".into(),
            name: "Sustainability".into(),
            slug: "sustainability".into(),
            status: PageStatus::Draft,
            updated_at: now.clone(),
            layout: vec![
                Block::new("b_h2", "hero")
                    .with_prop("subtitle", "Our philosophy")
                    .with_prop("title", "Sustainability<br>Statement")
                    .with_prop(
                        "desc",
                        "Sustainability sits at the core of our strategy. We commit to operating responsibly.",
                    )
                    .with_prop("bgImage", HERO_BG),
                Block::new("b_m1", "metric")
                    .with_prop("icon", "fa-leaf")
                    .with_prop("accent", "green")
                    .with_prop("value", "60%")
                    .with_prop("label", "CO2 footprint reduction"),
                Block::new("b_m2", "metric")
                    .with_prop("icon", "fa-users")
                    .with_prop("accent", "gold")
                    .with_prop("value", "92%")
                    .with_prop("label", "Local employment"),
            ],
        },
        Page {
            id: "about".into(),
            name: "About".into(),
            slug: "about".into(),
            status: PageStatus::Draft,
            updated_at: now.clone(),
            layout: vec![Block {
                image_id: Some("m7".into()),
                doc_id: Some("d2".into()),
                ..Block::new("b_a1", "section")
                    .with_prop("title", "History")
                    .with_prop("subtitle", "How we got here")
                    .with_prop("body", "Timeline of the group.")
            }],
        },
    ];

    let media = [
        ("m1", "ship-01.jpg", "ship,ocean"),
        ("m2", "gold-01.jpg", "gold,bar"),
        ("m3", "office-01.jpg", "office,building"),
        ("m4", "mine-01.jpg", "mine,industry"),
        ("m5", "solar-01.jpg", "solar,panels"),
        ("m6", "fish-01.jpg", "fishing,boat"),
        ("m7", "map-01.jpg", "map,world"),
        ("m8", "port-01.jpg", "port,container"),
    ]
    .into_iter()
    .map(|(id, name, topic)| MediaAsset {
        id: id.into(),
        name: name.into(),
        url: format!("https://source.unsplash.com/800x800/?{topic}"),
        created_at: now.clone(),
    })
    .collect();

    let docs = vec![
        Document {
            id: "d1".into(),
            title: "Corporate Report 2026".into(),
            category: "Corporate".into(),
            date: "2026-01-10".into(),
            url: "https://example.com/docs/corporate-2026.pdf".into(),
        },
        Document {
            id: "d2".into(),
            title: "Investor Presentation".into(),
            category: "Investors".into(),
            date: "2026-01-12".into(),
            url: "https://example.com/docs/investors.pdf".into(),
        },
        Document {
            id: "d3".into(),
            title: "ESG Policy".into(),
            category: "Compliance".into(),
            date: "2026-01-15".into(),
            url: "https://example.com/docs/esg.pdf".into(),
        },
    ];

    let news = vec![
        NewsItem {
            id: "n1".into(),
            title: "New ESG roadmap".into(),
            date: "2026-01-18".into(),
            status: NewsStatus::Published,
            excerpt: "Strategy update.".into(),
            body: "Demo content.".into(),
        },
        NewsItem {
            id: "n2".into(),
            title: "Logistics chain optimised".into(),
            date: "2026-01-16".into(),
            status: NewsStatus::Draft,
            excerpt: "Operational improvements.".into(),
            body: "Demo content.".into(),
        },
    ];

    let mut per_page = BTreeMap::new();
    per_page.insert(
        "index".to_string(),
        SeoPage {
            title: "Global Investment Holdings".into(),
        },
    );

    SiteState {
        version: "v1.0.0".into(),
        last_deploy_at: None,
        pages,
        news,
        media,
        docs,
        seo: SeoSettings {
            site_title: "Folio Demo".into(),
            site_description: "Family holding with global investments.".into(),
            per_page,
        },
    }
}

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
};
use cabline_core::{Database, PageData};

use crate::{context::ServerContext, errors::ServerResult};

/// Renders the sitemap of the site root and every page
pub fn render(site_url: &str, pages: &[PageData]) -> String {
    let base = site_url.trim_end_matches('/');

    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");
    push_url(&mut xml, &format!("{}/", base));

    for page in pages {
        push_url(&mut xml, &format!("{}/pages/{}.html", base, page.slug));
    }

    xml.push_str("</urlset>\n");
    xml
}

fn push_url(xml: &mut String, location: &str) {
    xml.push_str("  <url><loc>");
    xml.push_str(&escape(location));
    xml.push_str("</loc></url>\n");
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            c => escaped.push(c),
        }
    }

    escaped
}

#[utoipa::path(
    get,
    path = "/sitemap.xml",
    tag = "site",
    responses(
        (status = 200, content_type = "application/xml", body = String)
    )
)]
pub async fn sitemap(State(context): State<ServerContext>) -> ServerResult<Response> {
    let pages = context.site.database.list_pages().await?;
    let xml = render(&context.config.site_url, &pages);

    Ok(([(header::CONTENT_TYPE, "application/xml")], xml).into_response())
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    fn page(slug: &str) -> PageData {
        serde_json::from_value(json!({
            "id": 1,
            "slug": slug,
            "title": "Title",
            "metaDescription": "",
            "content": ""
        }))
        .unwrap()
    }

    #[test]
    fn test_render() {
        let xml = render("https://cabs.example/", &[page("airport-taxi")]);

        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<loc>https://cabs.example/</loc>"));
        assert!(xml.contains("<loc>https://cabs.example/pages/airport-taxi.html</loc>"));
        assert!(xml.trim_end().ends_with("</urlset>"));
    }

    #[test]
    fn test_render_escapes_slugs() {
        let xml = render("https://cabs.example", &[page("a&b<c>")]);

        assert!(xml.contains("/pages/a&amp;b&lt;c&gt;.html"));
    }

    #[test]
    fn test_render_without_pages() {
        let xml = render("https://cabs.example", &[]);

        assert_eq!(xml.matches("<url>").count(), 1);
    }
}

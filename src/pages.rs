//! Server-rendered public pages.

use axum::{Router, response::Html, routing::get};
use dioxus::prelude::*;
use dioxus_core::NoOpMutations;
use tracing::error;

use crate::AppState;
use crate::causes::{self, CAUSES, Cause};

fn layout_head() -> Element {
    rsx! {
        head {
            meta { charset: "utf-8" }
            title { "Hope Foundation" }
            script { src: "https://cdn.tailwindcss.com" }
        }
    }
}

fn cause_card(cause: &'static Cause) -> Element {
    let id = cause.id;
    let title = cause.title;
    let description = cause.description;
    let image = cause.image;
    let category = cause.category;
    let width = format!("width: {}%", cause.progress_percent());
    let raised = format!("${} raised of ${}", cause.raised, cause.goal);
    let donors = format!("{} donors", cause.donors);

    rsx! {
        article {
            key: "{id}",
            class: "rounded-xl bg-white shadow overflow-hidden",
            img { class: "h-48 w-full object-cover", src: "{image}", alt: "{title}" }
            div {
                class: "p-5 space-y-3",
                span { class: "text-xs uppercase text-emerald-600", "{category}" }
                h3 { class: "text-lg font-semibold", "{title}" }
                p { class: "text-sm text-gray-600", "{description}" }
                div {
                    class: "h-2 rounded-full bg-gray-200",
                    div { class: "h-2 rounded-full bg-emerald-500", style: "{width}" }
                }
                div {
                    class: "flex justify-between text-sm text-gray-500",
                    span { "{raised}" }
                    span { "{donors}" }
                }
                a {
                    class: "inline-block rounded bg-emerald-600 px-4 py-2 text-white",
                    href: "/donate?cause={id}",
                    "Donate"
                }
            }
        }
    }
}

fn home_page() -> Element {
    rsx! {
        {layout_head()}
        body {
            class: "bg-gray-50",
            header {
                class: "py-16 text-center space-y-4",
                h1 { class: "text-4xl font-bold", "Every gift brings hope" }
                p {
                    class: "text-gray-600",
                    "Support education, healthcare, clean water and emergency relief for communities in need."
                }
                a { class: "text-emerald-700 underline", href: "/causes", "See all causes" }
            }
            section {
                class: "mx-auto grid max-w-6xl gap-6 px-4 pb-16 md:grid-cols-3",
                {causes::featured().map(cause_card)}
            }
        }
    }
}

fn causes_page() -> Element {
    rsx! {
        {layout_head()}
        body {
            class: "bg-gray-50",
            header {
                class: "py-12 text-center",
                h1 { class: "text-3xl font-bold", "Our causes" }
            }
            section {
                class: "mx-auto grid max-w-6xl gap-6 px-4 pb-16 md:grid-cols-3",
                {CAUSES.iter().map(cause_card)}
            }
        }
    }
}

fn render(page: fn() -> Element) -> Html<String> {
    let mut vdom = VirtualDom::new(page);
    let mut mutations = NoOpMutations;
    vdom.rebuild(&mut mutations);

    let mut renderer = dioxus_ssr::Renderer::new();
    let mut buffer = String::new();
    if let Err(e) = renderer.render_to(&mut buffer, &vdom) {
        error!("Failed to render page: {e}");
        return Html("<!DOCTYPE html><html><body>Something went wrong.</body></html>".to_string());
    }

    Html(format!("<!DOCTYPE html><html>{buffer}</html>"))
}

async fn home() -> Html<String> {
    render(home_page)
}

async fn causes_list() -> Html<String> {
    render(causes_page)
}

pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/causes", get(causes_list))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_lists_only_featured_causes() {
        let Html(html) = render(home_page);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Education for Children"));
        assert!(!html.contains("Youth Sports Development"));
    }

    #[test]
    fn causes_page_lists_everything() {
        let Html(html) = render(causes_page);
        for cause in CAUSES.iter() {
            assert!(html.contains(cause.id), "missing {}", cause.id);
        }
    }
}

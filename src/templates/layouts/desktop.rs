use maud::{html, Markup, PreEscaped, DOCTYPE};

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; color: #1f2937; }
header { display: flex; align-items: center; justify-content: space-between; padding: 0.75rem 1.5rem; box-shadow: 0 1px 3px rgba(0,0,0,.1); }
header nav ul { display: flex; gap: 1rem; list-style: none; margin: 0; padding: 0; }
main.container { max-width: 1080px; margin: 2rem auto; padding: 0 1rem; }
table { border-collapse: collapse; width: 100%; }
th, td { text-align: left; padding: 0.4rem 0.6rem; border-bottom: 1px solid #e5e7eb; }
.card { border: 1px solid #e5e7eb; border-radius: 8px; padding: 1rem 1.25rem; margin-bottom: 1.5rem; }
.badge { border-radius: 999px; padding: 0.1rem 0.6rem; font-size: 0.85em; background: #e5e7eb; }
.badge.deployed { background: #dbeafe; color: #1e40af; }
.badge.ready { background: #dcfce7; color: #166534; }
.muted { color: #6b7280; }
"#;

pub fn desktop_layout(title: &str, user: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " · Asset Inventory" }
                style { (PreEscaped(STYLE)) }
            }
            body {
                header {
                    h3 { "Asset Inventory" }
                    nav {
                        ul {
                            li { a href="/" { "Search" } }
                            li { a href="/inventory/export.xlsx" { "Export" } }
                        }
                    }
                    span class="muted" { (user) }
                }
                (content)
            }
        }
    }
}

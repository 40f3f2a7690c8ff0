use crate::domain::InventoryItem;
use crate::templates::{desktop_layout, status_badge};
use maud::{html, Markup};
use url::form_urlencoded;

pub fn home_page(user: &str, query: &str, items: &[InventoryItem]) -> Markup {
    let export_href = if query.trim().is_empty() {
        "/inventory/export.xlsx".to_string()
    } else {
        let q: String = form_urlencoded::Serializer::new(String::new())
            .append_pair("q", query.trim())
            .finish();
        format!("/inventory/export.xlsx?{q}")
    };

    desktop_layout(
        "Search",
        user,
        html! {
            main class="container" {
                form method="get" action="/" {
                    input type="search" name="q" value=(query) placeholder="Asset, serial or model" autofocus;
                    " "
                    button type="submit" { "Search" }
                    " "
                    a href=(export_href) { "Download .xlsx" }
                }

                p class="muted" { (items.len()) " item(s)" }

                @if items.is_empty() {
                    p { "Nothing matches." }
                } @else {
                    table {
                        thead {
                            tr {
                                th { "Asset" }
                                th { "Serial" }
                                th { "Model" }
                                th { "Status" }
                                th { "User / Location" }
                            }
                        }
                        tbody {
                            @for item in items {
                                tr {
                                    td { a href={ "/items/" (item.id) } { (item.asset.as_deref().unwrap_or("(untitled)")) } }
                                    td { (item.serial.as_deref().unwrap_or("")) }
                                    td { (item.model.as_deref().unwrap_or("")) }
                                    td { (status_badge(item.status.as_deref())) }
                                    td { (item.user_location.as_deref().unwrap_or("")) }
                                }
                            }
                        }
                    }
                }
            }
        },
    )
}

use std::sync::Arc;

use async_trait::async_trait;
use axum::{response::Html, routing::get, Router};
use bookshelf_kernel::Module;
use serde_json::json;

const INDEX_HTML: &str = include_str!("index.html");

/// Static storefront page served at `/`
pub struct LandingModule;

#[async_trait]
impl Module for LandingModule {
    fn name(&self) -> &'static str {
        "landing"
    }

    fn mount_path(&self) -> String {
        "/".to_string()
    }

    fn routes(&self) -> Router {
        Router::new().route("/", get(index))
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "Landing page",
                        "tags": ["Landing"],
                        "responses": {
                            "200": {
                                "description": "Storefront HTML",
                                "content": {
                                    "text/html": {
                                        "schema": { "type": "string" }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }))
    }
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Create a new instance of the landing module
pub fn create_module() -> Arc<dyn Module> {
    Arc::new(LandingModule)
}

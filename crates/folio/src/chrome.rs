//! The `page-chrome` transform: site header, navigation column and footer.
//!
//! The body of the page ends up laid out as
//!
//! ```html
//! <header class="row no-gutters">
//!   <div class="col-lg-9 title-container"><h1>Title</h1><h2>Subtitle</h2></div>
//!   <div class="col-md-3 logo-container d-none d-lg-block"><img src="data:image/png;base64,..."></div>
//! </header>
//! <article class="row no-gutters">
//!   <aside class="col-lg-3"><nav></nav></aside>
//!   <section class="col-lg-9">original body content</section>
//! </article>
//! <footer class="row no-gutters"><div>Copyright 2024 Holder</div></footer>
//! ```
//!
//! The empty `<nav>` is where the `toc` transform puts its outline by default.

use std::cell::{Cell, RefCell};
use std::fmt::Write;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Datelike;
use fs_err as fs;
use lol_html::html_content::ContentType;
use lol_html::{RewriteStrSettings, element, rewrite_str, text};
use serde::Deserialize;

use crate::error::{Result, TransformError};
use crate::transform::HtmlTransform;

/// Options for [`PageChrome`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PageChromeOptions {
    /// PNG embedded in the header as a data URI.
    pub logo: Option<PathBuf>,
    /// Name following the year in the footer.
    pub copyright_holder: Option<String>,
    /// Year shown in the footer; the current year when unset.
    pub year: Option<i32>,
}

impl PageChromeOptions {
    pub(crate) fn resolve_paths(&mut self, root: &Path) {
        if let Some(logo) = &self.logo {
            self.logo = Some(root.join(logo));
        }
    }
}

/// The `page-chrome` transform.
#[derive(Debug, Clone)]
pub struct PageChrome {
    logo_base64: Option<String>,
    copyright: String,
}

impl PageChrome {
    /// Reads the logo, if any, up front.
    pub fn new(options: &PageChromeOptions) -> Result<Self> {
        let logo_base64 = match &options.logo {
            Some(path) => Some(STANDARD.encode(fs::read(path)?)),
            None => None,
        };
        let year = options.year.unwrap_or_else(|| chrono::Local::now().year());
        let copyright = match &options.copyright_holder {
            Some(holder) => format!("Copyright {year} {holder}"),
            None => format!("Copyright {year}"),
        };
        Ok(Self {
            logo_base64,
            copyright,
        })
    }

    fn collect(&self, html: &str) -> Result<(Option<String>, bool), TransformError> {
        let h1s: RefCell<Vec<String>> = RefCell::new(Vec::new());
        let has_title = Cell::new(false);

        rewrite_str(
            html,
            RewriteStrSettings {
                element_content_handlers: vec![
                    element!("h1", |_el| {
                        h1s.borrow_mut().push(String::new());
                        Ok(())
                    }),
                    text!("h1", |t| {
                        if let Some(current) = h1s.borrow_mut().last_mut() {
                            current.push_str(t.as_str());
                        }
                        Ok(())
                    }),
                    element!("head > title", |_el| {
                        has_title.set(true);
                        Ok(())
                    }),
                ],
                ..RewriteStrSettings::new()
            },
        )?;

        let title = h1s.into_inner().into_iter().next().map(|raw| {
            html_escape::decode_html_entities(&raw)
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        });
        Ok((title, has_title.get()))
    }

    fn header(&self, title: Option<&str>) -> String {
        let mut html = String::from(r#"<header class="row no-gutters"><div class="col-lg-9 title-container">"#);
        if let Some(title) = title {
            match title.split_once(':') {
                Some((main, subtitle)) => {
                    let _ = write!(
                        html,
                        "<h1>{}</h1><h2>{}</h2>",
                        html_escape::encode_text(main.trim()),
                        html_escape::encode_text(subtitle.trim())
                    );
                }
                None => {
                    let _ = write!(html, "<h1>{}</h1>", html_escape::encode_text(title));
                }
            }
        }
        html.push_str(r#"</div><div class="col-md-3 logo-container d-none d-lg-block">"#);
        if let Some(logo) = &self.logo_base64 {
            let _ = write!(html, r#"<img src="data:image/png;base64,{logo}">"#);
        }
        html.push_str(
            r#"</div></header><article class="row no-gutters"><aside class="col-lg-3"><nav></nav></aside><section class="col-lg-9">"#,
        );
        html
    }

    fn footer(&self) -> String {
        format!(
            r#"</section></article><footer class="row no-gutters"><div>{}</div></footer>"#,
            html_escape::encode_text(&self.copyright)
        )
    }
}

impl HtmlTransform for PageChrome {
    fn name(&self) -> &str {
        "page-chrome"
    }

    fn transform(&self, html: &str) -> Result<String, TransformError> {
        let (title, has_title) = self.collect(html)?;
        let header = self.header(title.as_deref());
        let footer = self.footer();

        let h1_seen = Cell::new(false);
        let title_set = Cell::new(false);

        let output = rewrite_str(
            html,
            RewriteStrSettings {
                element_content_handlers: vec![
                    element!("h1", |el| {
                        if !h1_seen.get() {
                            h1_seen.set(true);
                            el.remove();
                        }
                        Ok(())
                    }),
                    element!("head > title", |el| {
                        if let Some(text) = &title
                            && !title_set.get()
                        {
                            title_set.set(true);
                            el.set_inner_content(text, ContentType::Text);
                        }
                        Ok(())
                    }),
                    element!("head", |el| {
                        if let Some(text) = &title
                            && !has_title
                        {
                            el.append(
                                &format!("<title>{}</title>", html_escape::encode_text(text)),
                                ContentType::Html,
                            );
                        }
                        Ok(())
                    }),
                    element!("body", |el| {
                        el.prepend(&header, ContentType::Html);
                        el.append(&footer, ContentType::Html);
                        Ok(())
                    }),
                ],
                ..RewriteStrSettings::new()
            },
        )?;
        Ok(output)
    }
}

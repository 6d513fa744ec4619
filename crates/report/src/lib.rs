mod html;
mod text;

pub use html::{render_html_report, HtmlPage};
pub use text::write_text_report;

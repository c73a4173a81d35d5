//! Standalone HTML export of a persisted group
//!
//! Reads rows back out of the [`Store`] and writes a single self-contained
//! page. This sits outside the ingestion pipeline; it only consumes what
//! the pipeline persisted.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::*;

use crate::error::Result;
use crate::store::Store;

/// Write the persisted articles of a group as an HTML table
pub fn export_group_html(store: &mut Store, group_name: &str, out_path: &Path) -> Result<()> {
    let articles = store.articles_for_group(group_name)?;

    let file = File::create(out_path)?;
    let mut out = BufWriter::new(file);

    write_header(&mut out, group_name)?;
    writeln!(
        out,
        "<table><thead><tr><th>ArtNum</th><th>Subject</th><th>From</th>\
         <th>Date</th></tr></thead><tbody>"
    )?;
    for article in &articles {
        writeln!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            article.artnum,
            escape(&article.subject),
            escape(&article.author),
            escape(&article.date)
        )?;
    }
    writeln!(out, "</tbody></table>")?;
    writeln!(out, "</body></html>")?;
    out.flush()?;

    info!(
        "exported {} articles of {} to {}",
        articles.len(),
        group_name,
        out_path.display()
    );
    Ok(())
}

fn write_header(out: &mut impl Write, title: &str) -> std::io::Result<()> {
    writeln!(
        out,
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>{}</title>",
        escape(title)
    )?;
    writeln!(
        out,
        "<style>body{{font-family:Helvetica,Arial,sans-serif;margin:20px}}\
         h1{{font-size:18px}}table{{border-collapse:collapse;width:100%}}\
         th,td{{border:1px solid #ddd;padding:6px}}th{{background:#f7f7f7}}</style>"
    )?;
    writeln!(out, "</head><body><h1>{}</h1>", escape(title))
}

/// Minimal HTML escaping for text nodes and attribute values
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

//! Markdown-to-HTML rendering for assistant responses.
//!
//! This is deliberately not a CommonMark parser. It is an ordered chain of
//! pattern substitutions covering the dialect LLM output actually uses:
//! code fences, inline code, emphasis, headings, blockquotes, rules, lists,
//! pipe tables and paragraphs. The stage order is the contract; each stage
//! consumes the output of the previous one. Nested or malformed constructs
//! get whatever the rules produce.
//!
//! `render` is pure and deterministic, so during streaming it is simply
//! re-invoked on the whole cumulative text after every delta.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```(\w*)\n([\s\S]*?)\n```").expect("valid fence regex"));
static INLINE_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`]+)`").expect("valid inline code regex"));
static BOLD_STAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("valid bold regex"));
static BOLD_UNDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__([^_]+)__").expect("valid bold regex"));
static ITALIC_STAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*([^*]+)\*").expect("valid italic regex"));
static ITALIC_UNDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_([^_]+)_").expect("valid italic regex"));
static H3_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^### (.+)$").expect("valid heading regex"));
static H2_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^## (.+)$").expect("valid heading regex"));
static H1_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^# (.+)$").expect("valid heading regex"));
// The input is escaped before any block rule runs, so a quote marker at
// line start is `&gt;` by the time this stage sees it.
static BLOCKQUOTE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^&gt; (.+)$").expect("valid blockquote regex"));
static HR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(---|\*\*\*)$").expect("valid rule regex"));
static BULLET_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[\s]*[-*] (.+)$").expect("valid bullet regex"));
static NUMBERED_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[\s]*\d+\. (.+)$").expect("valid numbered regex"));
// `[^<]*` means items containing inline markup never join a run; that is
// part of the observable contract, not an oversight to fix here.
static LIST_RUN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(<li(?:\s+class="[^"]*")?>[^<]*</li>\s*)+"#).expect("valid list run regex")
});
static TABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(\|.+\|)\s*\n(\|[-\s|:]+\|)\s*\n((?:\|.+\|\s*\n?)*)")
        .expect("valid table regex")
});
static P_WRAPPED_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<p>(<(?:div|table|ul|ol|h[1-6]))").expect("valid cleanup regex")
});
static P_WRAPPED_CLOSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(</(?:div|table|ul|ol|h[1-6])>)</p>").expect("valid cleanup regex")
});

/// Escapes the HTML-significant characters. Runs before every other stage
/// so model output can never inject executable markup.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Renders a constrained markdown dialect into a sanitized HTML fragment.
///
/// Pure and deterministic: identical input yields byte-identical output.
pub fn render(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut out = escape_html(text);

    out = FENCE_RE
        .replace_all(&out, |caps: &Captures| {
            let language = &caps[1];
            let code = &caps[2];
            let label = if language.is_empty() {
                String::new()
            } else {
                format!("<div class=\"code-language\">{language}</div>")
            };
            format!(
                "<div class=\"code-block\">{label}<pre><code>{code}</code></pre>\
                 <button class=\"copy-code-btn\" onclick=\"copyToClipboard(this)\" \
                 title=\"Copy code\">\u{1F4CB}</button></div>"
            )
        })
        .into_owned();

    out = INLINE_CODE_RE
        .replace_all(&out, "<code class=\"inline-code\">$1</code>")
        .into_owned();

    // Double markers first so `**x**` is never read as two `*x*` pairs.
    out = BOLD_STAR_RE
        .replace_all(&out, "<strong>$1</strong>")
        .into_owned();
    out = BOLD_UNDER_RE
        .replace_all(&out, "<strong>$1</strong>")
        .into_owned();
    out = ITALIC_STAR_RE.replace_all(&out, "<em>$1</em>").into_owned();
    out = ITALIC_UNDER_RE.replace_all(&out, "<em>$1</em>").into_owned();

    out = H3_RE.replace_all(&out, "<h3>$1</h3>").into_owned();
    out = H2_RE.replace_all(&out, "<h2>$1</h2>").into_owned();
    out = H1_RE.replace_all(&out, "<h1>$1</h1>").into_owned();

    out = BLOCKQUOTE_RE
        .replace_all(&out, "<blockquote>$1</blockquote>")
        .into_owned();
    out = HR_RE.replace_all(&out, "<hr>").into_owned();

    out = BULLET_ITEM_RE.replace_all(&out, "<li>$1</li>").into_owned();
    out = NUMBERED_ITEM_RE
        .replace_all(&out, "<li class=\"numbered\">$1</li>")
        .into_owned();
    out = LIST_RUN_RE
        .replace_all(&out, |caps: &Captures| {
            let run = &caps[0];
            if run.contains("class=\"numbered\"") {
                format!("<ol>{}</ol>", run.replace(" class=\"numbered\"", ""))
            } else {
                format!("<ul>{run}</ul>")
            }
        })
        .into_owned();

    out = TABLE_RE
        .replace_all(&out, |caps: &Captures| render_table(&caps[1], &caps[3]))
        .into_owned();

    // Blank lines separate paragraphs; single newlines become soft breaks.
    out = out.replace("\n\n", "</p><p>");
    out = out.replace('\n', "<br>");
    out = format!("<p>{out}</p>");

    // Drop empty paragraphs and unwrap block elements the paragraph pass
    // accidentally wrapped.
    out = out.replace("<p></p>", "");
    out = out.replace("<p><br></p>", "");
    out = P_WRAPPED_OPEN_RE.replace_all(&out, "$1").into_owned();
    out = P_WRAPPED_CLOSE_RE.replace_all(&out, "$1").into_owned();

    out
}

fn render_table(header: &str, body: &str) -> String {
    let header_cells: String = inner_cells(header)
        .iter()
        .map(|cell| format!("<th>{}</th>", cell.trim()))
        .collect();

    let body_rows: String = body
        .trim()
        .split('\n')
        .filter(|row| row.contains('|'))
        .map(|row| {
            let cells: String = inner_cells(row)
                .iter()
                .map(|cell| format!("<td>{}</td>", cell.trim()))
                .collect();
            format!("<tr>{cells}</tr>")
        })
        .collect();

    format!(
        "<div class=\"table-container\"><table class=\"markdown-table\">\
         <thead><tr>{header_cells}</tr></thead><tbody>{body_rows}</tbody></table></div>"
    )
}

/// Cells between the outermost pipes: `| a | b |` yields `[" a ", " b "]`.
fn inner_cells(row: &str) -> Vec<&str> {
    let parts: Vec<&str> = row.split('|').collect();
    if parts.len() < 2 {
        return Vec::new();
    }
    parts[1..parts.len() - 1].to_vec()
}

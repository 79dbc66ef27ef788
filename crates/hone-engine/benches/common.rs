// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
#[allow(dead_code)]
pub fn generate_html_document(sections: usize) -> String {
    let mut html = String::from("<!DOCTYPE html>\n<html>\n<head><title>Bench</title>\n<style>p { margin: 0 }</style>\n</head>\n<body>\n");
    for section in 0..sections {
        html.push_str(&format!("<section id=\"s{section}\">\n"));
        html.push_str(&format!("  <h2>Section {section}</h2>\n"));
        html.push_str("  <p>Paragraph with <b>bold</b>, <a href=\"#x\">a link</a> &amp; an entity.</p>\n");
        html.push_str("  <ul>\n    <li>First item</li>\n    <li>Second item<br>with a break</li>\n  </ul>\n");
        html.push_str("  <!-- comment kept verbatim -->\n");
        html.push_str("  <table><tr><td>cell</td><td><img src=\"a.png\" alt=\"\"></td></tr></table>\n");
        html.push_str("</section>\n");
    }
    html.push_str("<script>if (a < b) { run(); }</script>\n</body>\n</html>\n");
    html
}

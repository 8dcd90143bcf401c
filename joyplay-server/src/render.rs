//! Host page for translated programs

const PAGE_HEAD: &str = r#"<html>
	<head></head>
	<body>
		<script>
			if (typeof window.joyOutput === 'undefined') window.joyOutput = {}
			window.joyOutput.log = function() {
				console.log.apply(console.log, arguments)
				window.top.postMessage(Array.from(arguments).join(" ") + "\n", "*")
			}
"#;

const PAGE_TAIL: &str = r#"
		</script>
	</body>
</html>"#;

/// Break up every `</script` (any letter case) so the program cannot end
/// its own script element
fn escape_script_close(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("</") {
        let (before, after) = rest.split_at(pos);
        out.push_str(before);
        match after.get(2..8) {
            Some(tag) if tag.eq_ignore_ascii_case("script") => out.push_str("<\\/"),
            _ => out.push_str("</"),
        }
        rest = &after[2..];
    }
    out.push_str(rest);
    out
}

/// Wrap a translated program in a page that forwards its `console.log`
/// output to the embedding frame.
///
/// Lines are forwarded in the order the program logs them.
pub fn render_page(artifact: &str) -> String {
    let redirected = artifact.replace("console.log", "window.joyOutput.log");
    let escaped = escape_script_close(&redirected);

    let mut page = String::with_capacity(PAGE_HEAD.len() + escaped.len() + PAGE_TAIL.len());
    page.push_str(PAGE_HEAD);
    page.push_str(&escaped);
    page.push_str(PAGE_TAIL);
    page
}

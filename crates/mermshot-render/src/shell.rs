//! HTML page shell and in-page probes.
//!
//! The shell loads Mermaid, renders the single `#diagram` container on page
//! load, and publishes the outcome through two globals: `renderComplete` and
//! `renderError`.

/// True once Mermaid has finished or failed.
pub(crate) const RENDER_SETTLED: &str = "Boolean(window.renderComplete || window.renderError)";

/// Mermaid failure message, `null` on success.
pub(crate) const RENDER_ERROR: &str = "window.renderError";

/// True once the page and its scripts have loaded.
pub(crate) const DOCUMENT_READY: &str = "document.readyState === 'complete'";

/// True once Mermaid has replaced the container content with the SVG.
pub(crate) const DIAGRAM_PROCESSED: &str =
    r#"document.querySelector('.mermaid[data-processed="true"]') !== null"#;

/// Selector of the diagram container.
pub(crate) const DIAGRAM_SELECTOR: &str = "#diagram";

/// Build the page shell for `source`.
///
/// The source is HTML-escaped; Mermaid decodes entities when it reads the
/// container, so labels containing `<br/>` or `<` survive unchanged.
pub(crate) fn page_shell(source: &str, script_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8">
    <script src="{script_url}"></script>
    <script>
      window.renderComplete = false;
      window.renderError = null;

      mermaid.initialize({{
        startOnLoad: false,
        theme: 'default',
        themeVariables: {{
          primaryColor: '#fff',
          primaryTextColor: '#000',
          primaryBorderColor: '#000',
          lineColor: '#000',
          secondaryColor: '#f5f5f5',
          tertiaryColor: '#f0f0f0'
        }},
        securityLevel: 'loose'
      }});

      window.addEventListener('load', async () => {{
        try {{
          await mermaid.run();
          window.renderComplete = true;
        }} catch (error) {{
          window.renderError = (error && error.message) || 'Unknown error';
          console.error('Mermaid render error:', error);
        }}
      }});
    </script>
    <style>
      body {{
        margin: 0;
        padding: 20px;
        background: white;
        display: flex;
        justify-content: center;
        align-items: center;
        min-height: 100vh;
      }}
      #diagram {{
        background: white;
        max-width: 2000px;
        max-height: 2000px;
      }}
    </style>
  </head>
  <body>
    <div id="diagram" class="mermaid">
{source}
    </div>
  </body>
</html>
"#,
        script_url = escape_html(script_url),
        source = escape_html(source),
    )
}

/// Escape text for embedding in HTML content or attribute values.
fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    result
}

use serde_json::Value;

const SCRIPT: &str = r#"
const spec = JSON.parse(document.getElementById('figure-spec').textContent);
const root = document.getElementById('figure');
const W = 900, H = 520, M = 60;
const palette = ['#0173b2','#de8f05','#029e73','#d55e00','#cc78bc','#ca9161','#fbafe4','#949494','#ece133','#56b4e9'];
const pts = spec.series.flatMap(s => s.points);
const numeric = k => pts.every(p => typeof p[k] === 'number' || p[k] === null);
const scale = k => {
  if (numeric(k)) {
    const v = pts.map(p => p[k]).filter(v => v !== null);
    const lo = Math.min(...v), hi = Math.max(...v), span = (hi - lo) || 1;
    return v => (v - lo) / span;
  }
  const cats = [...new Set(pts.map(p => String(p[k])))];
  return v => (cats.indexOf(String(v)) + 0.5) / (cats.length || 1);
};
const sx = scale('x'), sy = scale('y');
const ns = 'http://www.w3.org/2000/svg';
const svg = document.createElementNS(ns, 'svg');
svg.setAttribute('width', W); svg.setAttribute('height', H);
spec.series.forEach((s, i) => {
  s.points.forEach(p => {
    if (p.x === null || p.y === null) return;
    const c = document.createElementNS(ns, 'circle');
    c.setAttribute('cx', M + sx(p.x) * (W - 2 * M));
    c.setAttribute('cy', H - M - sy(p.y) * (H - 2 * M));
    c.setAttribute('r', 4);
    c.setAttribute('fill', palette[i % palette.length]);
    const t = document.createElementNS(ns, 'title');
    t.textContent = `${s.name}: ${p.text ?? ''} (${p.x}, ${p.y})`;
    c.appendChild(t);
    svg.appendChild(c);
  });
});
root.appendChild(svg);
const legend = document.createElement('ul');
spec.series.forEach((s, i) => {
  const li = document.createElement('li');
  li.style.color = palette[i % palette.length];
  li.textContent = `${s.name} (${s.points.length})`;
  legend.appendChild(li);
});
root.appendChild(legend);
"#;

pub fn render_document(spec: &Value) -> String {
    let title = spec
        .get("title")
        .and_then(Value::as_str)
        .unwrap_or("figure");
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    out.push_str("</head>\n<body>\n");
    out.push_str(&format!("<h2>{}</h2>\n", escape_html(title)));
    out.push_str("<div id=\"figure\"></div>\n");
    out.push_str("<script type=\"application/json\" id=\"figure-spec\">");
    // `</` inside the payload would close the script element early.
    out.push_str(&spec.to_string().replace("</", "<\\/"));
    out.push_str("</script>\n<script>");
    out.push_str(SCRIPT);
    out.push_str("</script>\n</body>\n</html>\n");
    out
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
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

//! Combined multi-page HTML report

use super::escape;
use crate::{models::SampleSequence, types::Phase};
use chrono::{DateTime, Local};
use std::fmt::Write as _;

const STYLE: &str = "\
body { font-family: sans-serif; margin: 2em; }
.page { page-break-after: always; break-after: page; margin-bottom: 3em; }
.page:last-child { page-break-after: auto; break-after: auto; }
table { border-collapse: collapse; }
th, td { border: 1px solid #999; padding: 2px 10px; text-align: right; }
th { background: #eee; }
td.negative { color: #b00; font-weight: bold; }
";

/// Render the report: one page per chart, then a page with every sample
pub fn render_document(charts: &[(Phase, String)], samples: &SampleSequence, generated: DateTime<Local>) -> String {
    let mut html = String::new();
    let _ = writeln!(html, "<!DOCTYPE html>");
    let _ = writeln!(html, "<html><head><meta charset=\"utf-8\"><title>Latency Sampler Report</title>");
    let _ = writeln!(html, "<style>{}</style></head><body>", STYLE);

    for (phase, svg) in charts {
        let _ = writeln!(html, "<section class=\"page\" id=\"{}\">", phase.file_stem());
        let _ = writeln!(html, "<h1>{}</h1>", escape(phase.chart_title()));
        html.push_str(svg);
        let _ = writeln!(html, "</section>");
    }

    let _ = writeln!(html, "<section class=\"page\" id=\"samples\">");
    let _ = writeln!(html, "<h1>Samples</h1>");
    let _ = writeln!(
        html,
        "<p>Generated {}. {} samples.</p>",
        escape(&generated.format("%Y-%m-%d %H:%M:%S").to_string()),
        samples.len()
    );

    let negative = samples.iter().filter(|s| s.http_latency_ms < 0.0).count();
    if negative > 0 {
        let _ = writeln!(
            html,
            "<p class=\"note\">{} samples have a negative HTTP latency: the DNS and TCP phases of those \
             iterations took longer than the whole request. They are marked below.</p>",
            negative
        );
    }

    let _ = writeln!(
        html,
        "<table><thead><tr><th>Iteration</th><th>HTTP Latency</th><th>DNS Latency</th><th>TCP Latency</th></tr></thead><tbody>"
    );
    for sample in samples {
        let http_class = if sample.http_latency_ms < 0.0 { " class=\"negative\"" } else { "" };
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td{}>{}</td><td>{}</td><td>{}</td></tr>",
            sample.sequence_number,
            http_class,
            sample.http_latency_ms,
            sample.dns_latency_ms,
            sample.tcp_latency_ms
        );
    }
    let _ = writeln!(html, "</tbody></table>");
    let _ = writeln!(html, "</section>");
    let _ = writeln!(html, "</body></html>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sample;

    fn samples() -> SampleSequence {
        SampleSequence::from_samples(vec![Sample::new(1, 7.0, 5.0, 8.0), Sample::new(2, -3.5, 10.0, 9.0)]).unwrap()
    }

    #[test]
    fn test_document_has_one_page_per_chart_plus_table() {
        let charts = vec![
            (Phase::Http, "<svg>h</svg>".to_string()),
            (Phase::Tcp, "<svg>t</svg>".to_string()),
            (Phase::Dns, "<svg>d</svg>".to_string()),
        ];

        let html = render_document(&charts, &samples(), Local::now());

        assert_eq!(html.matches("<section class=\"page\"").count(), 4);
        assert!(html.contains("<svg>t</svg>"));
        assert!(html.contains("<th>Iteration</th><th>HTTP Latency</th><th>DNS Latency</th><th>TCP Latency</th>"));
        assert!(html.contains("<tr><td>1</td><td>7</td><td>5</td><td>8</td></tr>"));
    }

    #[test]
    fn test_negative_http_is_flagged() {
        let html = render_document(&[], &samples(), Local::now());

        assert!(html.contains("<td class=\"negative\">-3.5</td>"));
        assert!(html.contains("1 samples have a negative HTTP latency"));
    }
}

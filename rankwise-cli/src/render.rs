//! Plain-text rendering for CLI output.

use rankwise_core::catalog::Vertical;
use rankwise_core::comparison::Comparison;
use rankwise_core::faq::FaqEntry;
use rankwise_core::probe::{GatheringOutcome, LeakTestResult, WebRtcLeak};
use rankwise_core::ranking::{VerticalSummary, starting_price_or};
use rankwise_core::{Product, ProbeState};

pub fn verticals(verticals: &[&Vertical]) -> String {
    if verticals.is_empty() {
        return "No active verticals.".to_string();
    }
    let width = verticals.iter().map(|v| v.slug.len()).max().unwrap_or(0);
    verticals
        .iter()
        .map(|v| format!("{:<width$}  {}", v.slug, v.name))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Numbered product table: rank, name, rating, starting price.
pub fn product_table(products: &[&Product], price_placeholder: &str) -> String {
    if products.is_empty() {
        return "No products.".to_string();
    }
    let width = products.iter().map(|p| p.name.len()).max().unwrap_or(0);
    products
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let badge = if p.is_editors_choice { "  [Editor's Choice]" } else { "" };
            format!(
                "{:>2}. {:<width$}  {:>4.1}  {}{}",
                i + 1,
                p.name,
                p.overall_rating,
                starting_price_or(p, price_placeholder),
                badge
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn comparison(cmp: &Comparison<'_>, price_placeholder: &str) -> String {
    let [a, b] = cmp.products;
    let mut out = format!("{}\n", cmp.title);
    for p in [a, b] {
        out.push_str(&format!(
            "  {:<24} {:>4.1}  {}\n",
            p.name,
            p.overall_rating,
            starting_price_or(p, price_placeholder)
        ));
    }
    if cmp.is_tie {
        out.push_str(&format!("Winner: {} (tie)", cmp.winner.name));
    } else {
        out.push_str(&format!("Winner: {} by {:.1}", cmp.winner.name, cmp.margin));
    }
    out
}

pub fn faq(entries: &[FaqEntry]) -> String {
    entries
        .iter()
        .map(|e| format!("Q: {}\nA: {}", e.question, e.answer))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn summary(name: &str, summary: &VerticalSummary, top: &[&Product]) -> String {
    let mut out = format!("{name}\n");
    out.push_str(&format!("  Products:        {}\n", summary.product_count));
    if let Some(avg) = summary.average_rating {
        out.push_str(&format!("  Average rating:  {avg:.2}\n"));
    }
    if let Some(range) = &summary.price_range {
        out.push_str(&format!("  Price range:     {}\n", range.label()));
    }
    out.push_str(&format!("  Editor's choice: {}\n", summary.editors_choice_count));
    if let Some(slug) = &summary.most_recently_updated {
        out.push_str(&format!("  Last updated:    {slug}\n"));
    }
    if !summary.feature_counts.is_empty() {
        out.push_str("  Features:\n");
        for (feature, count) in &summary.feature_counts {
            out.push_str(&format!("    {feature}: {count}\n"));
        }
    }
    if !top.is_empty() {
        let names: Vec<&str> = top.iter().map(|p| p.name.as_str()).collect();
        out.push_str(&format!("  Top rated:       {}\n", names.join(", ")));
    }
    out.trim_end().to_string()
}

fn webrtc(leak: &WebRtcLeak) -> String {
    let list = |ips: &[String]| {
        if ips.is_empty() {
            "none".to_string()
        } else {
            ips.join(", ")
        }
    };
    format!(
        "  WebRTC public:   {}\n  WebRTC local:    {}",
        list(&leak.public_ips),
        list(&leak.local_ips)
    )
}

pub fn leak_result(result: &LeakTestResult) -> String {
    let mut out = format!("Status: {}\n", result.overall_status.to_string().to_uppercase());
    match &result.ip_info {
        Some(info) => {
            out.push_str(&format!("  IP:              {}\n", info.ip));
            let location: Vec<&str> = [&info.city, &info.region, &info.country]
                .into_iter()
                .map(String::as_str)
                .filter(|s| !s.is_empty())
                .collect();
            if !location.is_empty() {
                out.push_str(&format!("  Location:        {}\n", location.join(", ")));
            }
            if !info.provider().is_empty() {
                out.push_str(&format!("  Provider:        {}\n", info.provider()));
            }
        }
        None => out.push_str("  IP:              unknown\n"),
    }
    out.push_str(&webrtc(&result.webrtc_leak));
    let gathering = match result.ice_gathering {
        GatheringOutcome::Completed => None,
        GatheringOutcome::TimedOut => Some("ICE gathering timed out; results are partial"),
        GatheringOutcome::Unsupported => Some("WebRTC is unavailable; nothing can leak through it"),
        GatheringOutcome::Failed => Some("ICE gathering failed"),
    };
    if let Some(note) = gathering {
        out.push_str(&format!("\n  Note:            {note}"));
    }
    if !result.dns_leak.tested {
        out.push_str("\n  DNS leak:        not tested");
    }
    out
}

pub fn probe_state(state: &ProbeState) -> String {
    match state {
        ProbeState::Complete { result, .. } => leak_result(result),
        ProbeState::Error {
            message, partial, ..
        } => format!("Leak test failed: {message}\n{}", webrtc(partial)),
        other => format!("Leak test {}", other.label()),
    }
}

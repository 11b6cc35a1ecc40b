//! FAQ entries for product and comparison pages.

use serde::Serialize;

use crate::catalog::Product;
use crate::comparison::Comparison;
use crate::ranking::{cheapest_plan, format_plan_price, starting_price_or};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

impl FaqEntry {
    fn new(question: String, answer: String) -> Self {
        Self { question, answer }
    }
}

fn verdict(rating: f64) -> &'static str {
    match rating {
        r if r >= 9.0 => "one of the best options we have tested",
        r if r >= 8.0 => "a strong choice for most people",
        r if r >= 6.5 => "a reasonable pick with some trade-offs",
        _ => "hard to recommend over its competitors",
    }
}

pub fn product_faq(product: &Product, price_placeholder: &str) -> Vec<FaqEntry> {
    let mut entries = Vec::with_capacity(3);

    let mut worth_it = format!(
        "{} scores {:.1}/10 in our testing, making it {}.",
        product.name,
        product.overall_rating,
        verdict(product.overall_rating)
    );
    if let Some(pro) = product.pros.first() {
        worth_it.push_str(&format!(" Its biggest strength: {}.", pro.trim_end_matches('.')));
    }
    entries.push(FaqEntry::new(format!("Is {} worth it?", product.name), worth_it));

    if !product.pricing.is_empty() {
        let price = starting_price_or(product, price_placeholder);
        let plans = product.pricing.len();
        let answer = if price == "Free" {
            format!(
                "{} has a free plan. {} plan{} available in total.",
                product.name,
                plans,
                if plans == 1 { " is" } else { "s are" }
            )
        } else {
            format!(
                "{} starts at {}. {} plan{} available in total.",
                product.name,
                price,
                plans,
                if plans == 1 { " is" } else { "s are" }
            )
        };
        entries.push(FaqEntry::new(
            format!("How much does {} cost?", product.name),
            answer,
        ));
    }

    if !product.cons.is_empty() {
        let cons: Vec<&str> = product
            .cons
            .iter()
            .take(2)
            .map(|c| c.trim_end_matches('.'))
            .collect();
        entries.push(FaqEntry::new(
            format!("What are the main drawbacks of {}?", product.name),
            format!("{}.", cons.join("; ")),
        ));
    }

    entries
}

pub fn comparison_faq(comparison: &Comparison<'_>) -> Vec<FaqEntry> {
    let [a, b] = comparison.products;
    let winner = comparison.winner;
    let loser = comparison.loser();
    let mut entries = Vec::with_capacity(2);

    let better = if comparison.is_tie {
        format!(
            "{} and {} are tied at {:.1}/10. We give {} the edge as our listed pick.",
            a.name, b.name, winner.overall_rating, winner.name
        )
    } else {
        format!(
            "{} wins with {:.1}/10 against {:.1}/10 for {}.",
            winner.name, winner.overall_rating, loser.overall_rating, loser.name
        )
    };
    entries.push(FaqEntry::new(
        format!("Which is better, {} or {}?", a.name, b.name),
        better,
    ));

    if let (Some(pa), Some(pb)) = (cheapest_plan(a), cheapest_plan(b)) {
        let answer = if pa.price < pb.price {
            format!(
                "Yes. {} starts at {} while {} starts at {}.",
                a.name,
                format_plan_price(pa),
                b.name,
                format_plan_price(pb)
            )
        } else if pa.price > pb.price {
            format!(
                "No. {} starts at {} while {} starts at {}.",
                a.name,
                format_plan_price(pa),
                b.name,
                format_plan_price(pb)
            )
        } else {
            format!("Both start at {}.", format_plan_price(pa))
        };
        entries.push(FaqEntry::new(
            format!("Is {} cheaper than {}?", a.name, b.name),
            answer,
        ));
    }

    entries
}

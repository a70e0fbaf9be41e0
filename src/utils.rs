// Raffle client - Display helpers
use crate::state::Entrants;

/// Convert lamports to SOL (for display purposes)
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / 1_000_000_000.0
}

/// Convert a raw token amount to its UI amount given the mint decimals
pub fn ui_amount(amount: u64, decimals: u8) -> f64 {
    amount as f64 / 10f64.powi(decimals as i32)
}

/// Ticket tally as shown on a raffle card, "∞" for uncapped raffles
pub fn format_tally(entrants: Option<&Entrants>) -> String {
    match entrants {
        Some(e) if e.is_uncapped() => format!("{} / ∞", e.total),
        Some(e) => format!("{} / {}", e.total, e.max),
        None => "0 / 0".to_string(),
    }
}

use super::{buyer, item};
use crate::market::{Buyer, MarketError};
use anyhow::Result;
use std::{
    sync::atomic::{AtomicU64, Ordering},
    thread,
};

#[test]
fn spends_only_what_it_has() -> Result<()> {
    let club = buyer("Bayern", 180);

    assert!(club.has_enough_budget(180));
    assert!(!club.has_enough_budget(181));

    assert!(club.spend_budget(100));
    assert!(!club.spend_budget(81));
    assert_eq!(club.remaining_budget(), 80);
    assert!(club.spend_budget(80));
    assert_eq!(club.remaining_budget(), 0);
    assert!(!club.spend_budget(1));
    assert!(club.spend_budget(0));

    assert_eq!(club.initial_budget(), 180);
    assert_eq!(club.spent(), 180);
    Ok(())
}

#[test]
fn concurrent_debits_never_overdraw() -> Result<()> {
    let club = buyer("City", 1000);
    let successes = AtomicU64::new(0);

    thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                for _ in 0..100 {
                    if club.spend_budget(7) {
                        successes.fetch_add(1, Ordering::SeqCst);
                    }
                }
            });
        }
    });

    let successes = successes.load(Ordering::SeqCst);
    assert_eq!(successes, 1000 / 7);
    assert_eq!(club.remaining_budget(), 1000 - 7 * successes);
    Ok(())
}

#[test]
fn keeps_acquisitions_in_order() -> Result<()> {
    let club = buyer("Juve", 120);
    club.record_acquisition(item("Buffon", 30));
    club.record_acquisition(item("Zidane", 55));

    let names: Vec<_> = club
        .acquired()
        .iter()
        .map(|item| item.name().to_owned())
        .collect();
    assert_eq!(names, vec!["Buffon", "Zidane"]);
    assert_eq!(club.acquired_value(), 85);
    Ok(())
}

#[test]
fn rejects_empty_name() {
    assert_eq!(Buyer::new("", 10).unwrap_err(), MarketError::EmptyName);
}

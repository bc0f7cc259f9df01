mod common;

use std::sync::Arc;

use anyhow::Result;
use coffer::application::{Outcome, Rejection};
use common::{balance_of, open_account, test_service, transaction_count};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_withdrawals_never_overdraw() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let id = open_account(&service, "100").await?;
    let service = Arc::new(service);

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let service = Arc::clone(&service);
            tokio::spawn(async move { service.withdraw(id, "30").await })
        })
        .collect();

    let mut outcomes: Vec<Outcome> = Vec::new();
    for handle in handles {
        outcomes.push(handle.await??);
    }

    let approved = outcomes.iter().filter(|o| o.is_approved()).count();
    assert_eq!(approved, 3);
    assert!(outcomes
        .iter()
        .filter(|o| o.is_cancelled())
        .all(|o| matches!(o.rejection(), Some(Rejection::InsufficientFunds { .. }))));

    assert_eq!(balance_of(&service, id).await?, 1000);
    assert_eq!(transaction_count(&service).await?, 3);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_transfers_conserve_money() -> Result<()> {
    let (service, _temp) = test_service().await?;
    let a = open_account(&service, "50").await?;
    let b = open_account(&service, "50").await?;
    let service = Arc::new(service);

    let handles: Vec<_> = (0..20)
        .map(|i| {
            let service = Arc::clone(&service);
            let (from, to) = if i % 2 == 0 { (a, b) } else { (b, a) };
            tokio::spawn(async move { service.transfer(from, to, "7.25").await })
        })
        .collect();

    for handle in handles {
        handle.await??;
    }

    let total = balance_of(&service, a).await? + balance_of(&service, b).await?;
    assert_eq!(total, 10000);
    assert!(balance_of(&service, a).await? >= 0);
    assert!(balance_of(&service, b).await? >= 0);
    assert_eq!(transaction_count(&service).await? % 2, 0);
    Ok(())
}

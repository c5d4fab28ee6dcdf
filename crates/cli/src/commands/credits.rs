//! Credit support commands.
//!
//! Used to answer "where did my credits go" tickets and to make good on a
//! payment whose webhook never arrived.

use fitting_room_core::UserId;
use fitting_room_studio::db::ProfileRepository;

use super::{CommandError, connect};

/// Print a user's balance.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable.
pub async fn show(user_id: UserId) -> Result<(), CommandError> {
    let pool = connect().await?;
    let balance = ProfileRepository::new(&pool).get_or_create(user_id).await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{user_id}: {balance} credits");
    }
    Ok(())
}

/// Add `credits` to a user's balance.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or the amount does
/// not fit.
pub async fn grant(user_id: UserId, credits: u32) -> Result<(), CommandError> {
    let pool = connect().await?;
    let balance = ProfileRepository::new(&pool)
        .add_credits(user_id, credits)
        .await?;

    tracing::info!(%user_id, credits, %balance, "Credits granted");
    #[allow(clippy::print_stdout)]
    {
        println!("{user_id}: granted {credits}, balance now {balance}");
    }
    Ok(())
}

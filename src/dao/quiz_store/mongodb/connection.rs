use std::time::Duration;

use mongodb::{Client, Database, bson::doc, options::ClientOptions};
use tokio::time::sleep;
use tracing::warn;

use super::error::{MongoDaoError, MongoResult};

const PING_ATTEMPTS: u32 = 10;
const PING_INITIAL_DELAY: Duration = Duration::from_millis(250);
const PING_MAX_DELAY: Duration = Duration::from_secs(5);

/// Build a client for the quiz database and wait until it answers a ping.
///
/// The driver connects lazily, so a freshly constructed client says nothing
/// about reachability; the ping loop below is what decides whether the
/// supervisor may install the store.
pub async fn establish_connection(
    options: &ClientOptions,
    database_name: &str,
) -> MongoResult<(Client, Database)> {
    let client = Client::with_options(options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(database_name);

    wait_until_reachable(&database).await?;
    Ok((client, database))
}

async fn wait_until_reachable(database: &Database) -> MongoResult<()> {
    let mut delay = PING_INITIAL_DELAY;
    let mut attempt = 0;

    loop {
        match database.run_command(doc! { "ping": 1 }).await {
            Ok(_) => return Ok(()),
            Err(err) => {
                attempt += 1;
                if attempt >= PING_ATTEMPTS {
                    return Err(MongoDaoError::InitialPing {
                        attempts: attempt,
                        source: err,
                    });
                }
                warn!(attempt, error = %err, "quiz database ping failed, retrying");
                sleep(delay).await;
                delay = (delay * 2).min(PING_MAX_DELAY);
            }
        }
    }
}

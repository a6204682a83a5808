use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};

use crate::config::Config;

pub type DbPool = Pool<ConnectionManager<PgConnection>>;

pub fn create_pool(config: &Config) -> Result<DbPool, r2d2::Error> {
    let manager = ConnectionManager::<PgConnection>::new(&config.database_url);
    Pool::builder()
        .max_size(config.pool_size)
        .connection_timeout(config.connect_timeout)
        .build(manager)
}

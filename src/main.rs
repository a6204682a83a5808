use dotenvy::dotenv;
use procurement_engine::{create_pool, run_migrations, Config};

fn main() {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().expect("invalid configuration");
    let pool = create_pool(&config).expect("Failed to create DB connection pool");
    run_migrations(&pool).expect("Failed to run database migrations");

    log::info!(
        "Procurement store ready (pool size {}, connect timeout {:?})",
        config.pool_size,
        config.connect_timeout
    );
}

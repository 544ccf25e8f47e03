use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use ecom_auth::{
    AuthError, AuthGuard, AuthService, PasswordHasher, RegisterUser, SessionStore, TokenLifetimes,
    TokenSigner, UserStore,
};
use ecom_core::StoreError;
use ecom_infra::{
    AdminSeed, AppConfig, Argon2Hasher, InMemoryLedgerStore, InMemorySessionStore,
    InMemoryUserStore, PostgresLedgerStore, PostgresSessionStore, PostgresUserStore, db,
};
use ecom_orders::{LedgerStore, OrderLedger};

/// Everything the handlers need, shared behind an `Arc`.
pub struct AppServices {
    pub auth: AuthService,
    pub orders: OrderLedger<Arc<dyn LedgerStore>>,
    pub guard: AuthGuard,
}

impl AppServices {
    pub fn new(
        signer: Arc<TokenSigner>,
        sessions: Arc<dyn SessionStore>,
        users: Arc<dyn UserStore>,
        ledger: Arc<dyn LedgerStore>,
        lifetimes: TokenLifetimes,
    ) -> Self {
        let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2Hasher::new());
        Self {
            auth: AuthService::new(signer.clone(), sessions, users, hasher, lifetimes),
            orders: OrderLedger::new(ledger),
            guard: AuthGuard::new(signer),
        }
    }

    /// Services over fresh in-memory stores.
    pub fn in_memory(jwt_secret: &str, lifetimes: TokenLifetimes) -> Self {
        Self::new(
            Arc::new(TokenSigner::new(jwt_secret)),
            Arc::new(InMemorySessionStore::new()),
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemoryLedgerStore::new()),
            lifetimes,
        )
    }

    /// Register the seed admin unless the email is already taken.
    pub async fn seed_admin(&self, seed: &AdminSeed) -> Result<(), AuthError> {
        let result = self
            .auth
            .register(RegisterUser {
                name: "admin".to_string(),
                email: seed.email.clone(),
                password: seed.password.clone(),
                is_admin: true,
            })
            .await;

        match result {
            Ok(user) => {
                info!(user_id = %user.id, "seeded admin user");
                Ok(())
            }
            Err(AuthError::Store(StoreError::Conflict(_))) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Build services from configuration: Postgres when `DATABASE_URL` is set,
/// in-memory stores otherwise.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let lifetimes = config.token_lifetimes();

    let services = match &config.database_url {
        Some(url) => {
            let pool = db::connect(url, config.database_max_connections).await?;
            db::apply_schema(&pool).await?;
            AppServices::new(
                Arc::new(TokenSigner::new(&config.jwt_secret)),
                Arc::new(PostgresSessionStore::new(pool.clone())),
                Arc::new(PostgresUserStore::new(pool.clone())),
                Arc::new(PostgresLedgerStore::new(pool)),
                lifetimes,
            )
        }
        None => {
            warn!("running with in-memory stores; data is lost on restart");
            AppServices::in_memory(&config.jwt_secret, lifetimes)
        }
    };

    if let Some(seed) = &config.admin_seed {
        services
            .seed_admin(seed)
            .await
            .context("failed to seed admin user")?;
    }

    Ok(services)
}

//! Storefront entry-point: loads settings, wires adapters and serves the API.

mod server;

use std::sync::Arc;
use std::time::Duration;

use actix_web::web;
use color_eyre::eyre::{Context, Result, eyre};
use mockable::{DefaultClock, DefaultEnv};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use storefront::domain::ports::{
    CategoryRepository, ImageStore, OrderRepository, ProductRepository, SiteConfigRepository,
    UnconfiguredImageStore, UserRepository,
};
use storefront::domain::{AdminBootstrap, BootstrapOutcome};
use storefront::inbound::http::auth_config::{AuthSettings, BuildMode, auth_settings_from_env};
use storefront::inbound::http::health::HealthState;
use storefront::inbound::http::state::{HttpSettings, HttpState, HttpStatePorts};
use storefront::middleware::RatePolicies;
use storefront::outbound::images::CloudinaryImageStore;
use storefront::outbound::memory::InMemoryStore;
use storefront::outbound::persistence::{
    DbPool, DieselCategoryRepository, DieselOrderRepository, DieselProductRepository,
    DieselSiteConfigRepository, DieselUserRepository, PoolConfig, run_migrations,
};
use storefront::outbound::security::{Argon2CredentialHasher, JwtTokenCodec};

use server::{AppSettings, ServerConfig, create_server};

const IMAGE_UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Repository adapters, either PostgreSQL-backed or in-memory.
struct Stores {
    users: Arc<dyn UserRepository>,
    categories: Arc<dyn CategoryRepository>,
    products: Arc<dyn ProductRepository>,
    orders: Arc<dyn OrderRepository>,
    site_configs: Arc<dyn SiteConfigRepository>,
}

async fn build_stores(settings: &AppSettings) -> Result<Stores> {
    let Some(database_url) = settings.database_url.as_deref() else {
        warn!("no database_url configured; using the in-memory store (data is lost on restart)");
        let store = Arc::new(InMemoryStore::new());
        return Ok(Stores {
            users: store.clone(),
            categories: store.clone(),
            products: store.clone(),
            orders: store.clone(),
            site_configs: store,
        });
    };

    run_migrations(database_url)
        .await
        .wrap_err("database migrations failed")?;
    info!("database migrations applied");

    let pool = DbPool::new(
        PoolConfig::new(database_url).with_max_size(settings.db_max_connections()),
    )
    .await
    .map_err(|err| eyre!("failed to build database pool: {}", err.into_message()))?;
    Ok(Stores {
        users: Arc::new(DieselUserRepository::new(pool.clone())),
        categories: Arc::new(DieselCategoryRepository::new(pool.clone())),
        products: Arc::new(DieselProductRepository::new(pool.clone())),
        orders: Arc::new(DieselOrderRepository::new(pool.clone())),
        site_configs: Arc::new(DieselSiteConfigRepository::new(pool)),
    })
}

fn build_image_store(settings: &AppSettings) -> Result<Arc<dyn ImageStore>> {
    match settings.cloudinary() {
        Some(credentials) => {
            let store = CloudinaryImageStore::new(credentials, IMAGE_UPLOAD_TIMEOUT)
                .wrap_err("failed to configure Cloudinary")?;
            info!("Cloudinary image uploads enabled");
            Ok(Arc::new(store))
        }
        None => {
            warn!("Cloudinary credentials missing; image uploads will answer 503");
            Ok(Arc::new(UnconfiguredImageStore))
        }
    }
}

async fn bootstrap_admin(settings: &AppSettings, ports: &HttpStatePorts) -> Result<()> {
    let Some(account) = settings.admin_account()? else {
        return Ok(());
    };
    let outcome = AdminBootstrap::new(ports.users.clone(), ports.hasher.clone())
        .ensure(account)
        .await
        .map_err(|err| eyre!("administrator bootstrap failed: {}", err.message()))?;
    match outcome {
        BootstrapOutcome::Created(id) => info!(user_id = %id, "administrator account created"),
        BootstrapOutcome::Promoted(id) => info!(user_id = %id, "existing account promoted to administrator"),
        BootstrapOutcome::Unchanged(id) => info!(user_id = %id, "administrator account present"),
    }
    Ok(())
}

async fn build_ports(settings: &AppSettings, auth: &AuthSettings) -> Result<HttpStatePorts> {
    let stores = build_stores(settings).await?;
    let clock = Arc::new(DefaultClock);
    Ok(HttpStatePorts {
        users: stores.users,
        categories: stores.categories,
        products: stores.products,
        orders: stores.orders,
        site_configs: stores.site_configs,
        hasher: Arc::new(Argon2CredentialHasher::new()),
        tokens: Arc::new(JwtTokenCodec::with_clock(
            &auth.jwt_secret,
            auth.token_lifetime,
            clock.clone(),
        )),
        images: build_image_store(settings)?,
        clock,
    })
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings =
        AppSettings::load().map_err(|err| eyre!("failed to load settings: {err}"))?;
    let auth = auth_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .wrap_err("invalid authentication settings")?;

    let ports = build_ports(&settings, &auth).await?;
    bootstrap_admin(&settings, &ports).await?;

    let http_state = web::Data::new(HttpState::new(
        ports,
        HttpSettings {
            cookie_secure: auth.cookie_secure,
            upload_dir: settings.upload_dir(),
            rate_limits: RatePolicies::default(),
        },
    ));
    drop(auth);

    let health_state = web::Data::new(HealthState::new());
    let config = ServerConfig::new(
        http_state,
        settings.frontend_origin()?,
        settings.bind_target(),
    );
    let server = create_server(health_state.clone(), config).wrap_err("failed to start server")?;
    let outcome = server.await;
    health_state.mark_unhealthy();
    outcome.wrap_err("server terminated with an error")
}

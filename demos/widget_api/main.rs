//! Widget API demo
//!
//! Serves `Widget`, `Role` and `User` through the generic CRUD handlers,
//! plus the login route backed by a fixed credential table.
//!
//! ```text
//! cargo run --example widget_api [config.yaml]
//! curl 'http://127.0.0.1:3000/api/Widget?page=1&filter=Al'
//! curl 'http://127.0.0.1:3000/api/User?includes=role'
//! curl -X POST http://127.0.0.1:3000/api/User/login \
//!      -H 'content-type: application/json' \
//!      -d '{"username":"ada","secret":"analytical"}'
//! ```

use anycrud::prelude::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

impl_crud_entity!(Widget, expose: true, {
    name: String,
    code: Option<String>,
});

impl_crud_entity!(Role, expose: true, {
    name: String,
});

impl_crud_entity!(User, expose: true, {
    username: String,
    role_id: Option<i64>,
    role_name: Option<String>,
});

/// Fills `role_name` from the referenced role
fn resolve_role(db: &InMemoryDatabase, user: &mut User) -> Result<(), StorageError> {
    if let Some(role_id) = user.role_id {
        user.role_name = db.find::<Role>(role_id)?.map(|role| role.name);
    }
    Ok(())
}

async fn seed(db: &InMemoryDatabase) -> Result<()> {
    let mut roles = BusinessLogic::new(StoreFactory::<Role>::open(db)?);
    let admin = roles.create(Role::new("admin".to_string())).await?.data;

    let mut users = BusinessLogic::new(StoreFactory::<User>::open(db)?);
    users
        .create(User::new("ada".to_string(), Some(admin.id), None))
        .await?;

    let mut widgets = BusinessLogic::new(StoreFactory::<Widget>::open(db)?);
    for (name, code) in [("Alpha", "A-1"), ("Alpine", "A-2"), ("Beta", "B-1")] {
        widgets
            .create(Widget::new(name.to_string(), Some(code.to_string())))
            .await?;
    }

    tracing::info!("seeded demo data");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,anycrud=debug")),
        )
        .init();

    let mut config = match std::env::args().nth(1) {
        Some(path) => AppConfig::from_yaml_file(path)?,
        None => AppConfig::default(),
    };
    if config.jwt.secret.is_empty() {
        tracing::warn!("jwt.secret not configured, using the demo secret");
        config.jwt.secret = "widget-api-demo-secret".to_string();
    }

    let db = InMemoryDatabase::new().with_include::<User, _>("role", resolve_role);
    seed(&db).await?;

    let catalog = EntityCatalog::<InMemoryDatabase>::new()
        .with::<Widget>()
        .with::<Role>()
        .with::<User>();

    let credentials = StaticCredentialCheck::new()
        .with_user("ada", "analytical", &["admin"])
        .with_user("grace", "compiler", &["user"]);
    let login = LoginService::new(
        Arc::new(credentials),
        Arc::new(JwtTokenIssuer::from_config(&config.jwt)),
        config.jwt.clone(),
    );

    let builder = ServerBuilder::new(config)
        .discover(&catalog, Arc::new(db))
        .with_login(login);

    for report in builder.discovery_reports() {
        for (name, reason) in &report.failed {
            tracing::error!(entity_type = %name, %reason, "entity not served");
        }
    }
    tracing::info!(entities = ?builder.entity_types(), "routes ready");

    builder.serve().await
}

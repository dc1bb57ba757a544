//! Service configuration: CLI flags merged over an optional YAML config
//! file, plus the YAML seed catalog loaded into the store at startup.

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;

use crate::model::{Category, Product, ProductId};

const DEFAULT_HTTP_BIND: &str = "127.0.0.1:8086";

#[derive(Debug, Parser)]
#[command(
    name = "babycart-orders",
    about = "Order placement service for the babycart storefront"
)]
pub struct CliArgs {
    /// Path to a YAML config file. CLI flags override file values.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Address the HTTP API binds to.
    #[arg(long, env = "BABYCART_HTTP_BIND")]
    pub http_bind: Option<SocketAddr>,

    /// YAML catalog seeded into the store at startup.
    #[arg(long, env = "BABYCART_SEED_CATALOG")]
    pub seed_catalog: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialConfig {
    http_bind: Option<SocketAddr>,
    seed_catalog: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub http_bind: SocketAddr,
    pub seed_catalog: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let CliArgs {
            config,
            http_bind: cli_http_bind,
            seed_catalog: cli_seed_catalog,
        } = args;

        let file_config = if let Some(path) = config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let http_bind = match cli_http_bind.or(file_config.http_bind) {
            Some(addr) => addr,
            None => DEFAULT_HTTP_BIND
                .parse()
                .context("default bind address is invalid")?,
        };

        let seed_catalog = cli_seed_catalog.or(file_config.seed_catalog);
        if let Some(path) = seed_catalog.as_ref() {
            anyhow::ensure!(
                path.exists(),
                "configured seed catalog {:?} does not exist",
                path
            );
            anyhow::ensure!(
                path.is_file(),
                "configured seed catalog {:?} is not a file",
                path
            );
        }

        Ok(Self {
            http_bind,
            seed_catalog,
        })
    }
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    serde_yaml::from_str(&raw).with_context(|| format!("failed to parse config file {:?}", path))
}

/// Catalog seeded into the store at startup, one list per category.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SeedCatalog {
    #[serde(default)]
    pub clothes: Vec<SeedProduct>,
    #[serde(default)]
    pub toys: Vec<SeedProduct>,
    #[serde(default)]
    pub bath: Vec<SeedProduct>,
    #[serde(default)]
    pub newborn: Vec<SeedProduct>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedProduct {
    /// Document id; generated when absent.
    #[serde(default)]
    pub id: Option<String>,
    /// Product code; legacy entries without one get a derived code at
    /// order time.
    #[serde(default)]
    pub product_code: Option<String>,
    pub name: String,
    pub selling_price: u64,
    pub in_stock: u32,
    #[serde(default)]
    pub weight_grams: Option<u32>,
}

impl SeedCatalog {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read seed catalog {:?}", path))?;
        serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse seed catalog {:?}", path))
    }

    pub fn len(&self) -> usize {
        self.clothes.len() + self.toys.len() + self.bath.len() + self.newborn.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into (category, product) pairs.
    pub fn into_entries(self) -> Vec<(Category, SeedProduct)> {
        let Self {
            clothes,
            toys,
            bath,
            newborn,
        } = self;
        let tagged = |category: Category, seeds: Vec<SeedProduct>| {
            seeds.into_iter().map(move |seed| (category, seed))
        };
        tagged(Category::Clothes, clothes)
            .chain(tagged(Category::Toy, toys))
            .chain(tagged(Category::Bath, bath))
            .chain(tagged(Category::Newborn, newborn))
            .collect()
    }
}

impl SeedProduct {
    pub fn into_product(self) -> Product {
        Product {
            id: ProductId(
                self.id
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            ),
            product_code: self.product_code,
            name: self.name,
            selling_price: self.selling_price,
            in_stock: self.in_stock,
            weight_grams: self.weight_grams,
        }
    }
}

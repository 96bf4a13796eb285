//! Seed the catalog with demo merchants and products.
//!
//! Inserts a handful of merchants clustered around central Jakarta, each
//! with a small menu, computing the geohash for every merchant the same way
//! the server does. Safe to re-run: rows are inserted with fresh ids each
//! time.

use secrecy::ExposeSecret;
use sqlx::PgPool;
use tracing::info;

use pronto_core::{Coordinate, MerchantCategory, MerchantId, ProductCategory, ProductId, geo};

use super::{CommandError, database_url};

struct SeedMerchant {
    name: &'static str,
    category: MerchantCategory,
    lat: f64,
    long: f64,
    menu: &'static [(&'static str, ProductCategory, i64)],
}

const MERCHANTS: &[SeedMerchant] = &[
    SeedMerchant {
        name: "Warung Nasi Uduk Ibu Sari",
        category: MerchantCategory::SmallRestaurant,
        lat: -6.1754,
        long: 106.8272,
        menu: &[
            ("Nasi Uduk", ProductCategory::Food, 15_000),
            ("Ayam Goreng", ProductCategory::Food, 18_000),
            ("Es Teh Manis", ProductCategory::Beverage, 5_000),
        ],
    },
    SeedMerchant {
        name: "Bakso Pak Budi",
        category: MerchantCategory::BoothKiosk,
        lat: -6.1761,
        long: 106.8290,
        menu: &[
            ("Bakso Urat", ProductCategory::Food, 20_000),
            ("Kerupuk", ProductCategory::Additions, 3_000),
        ],
    },
    SeedMerchant {
        name: "Toko Sembako Jaya",
        category: MerchantCategory::ConvenienceStore,
        lat: -6.1740,
        long: 106.8255,
        menu: &[
            ("Air Mineral 600ml", ProductCategory::Beverage, 4_000),
            ("Keripik Singkong", ProductCategory::Snack, 12_000),
            ("Sambal Botol", ProductCategory::Condiments, 16_000),
        ],
    },
    SeedMerchant {
        name: "Restoran Padang Sederhana",
        category: MerchantCategory::LargeRestaurant,
        lat: -6.1802,
        long: 106.8310,
        menu: &[
            ("Rendang", ProductCategory::Food, 28_000),
            ("Gulai Ayam", ProductCategory::Food, 24_000),
            ("Teh Talua", ProductCategory::Beverage, 10_000),
        ],
    },
];

/// Insert the demo catalog.
///
/// # Errors
///
/// Returns an error if the database URL is missing or an insert fails.
pub async fn run() -> Result<(), CommandError> {
    let database_url = database_url()?;

    info!("Connecting to database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    for seed in MERCHANTS {
        let merchant_id = MerchantId::generate();
        let location = Coordinate::new(seed.lat, seed.long);

        sqlx::query(
            "INSERT INTO merchant (id, name, category, image_url, lat, long, geohash) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(merchant_id.as_str())
        .bind(seed.name)
        .bind(seed.category.as_str())
        .bind(format!(
            "https://img.example.com/{}.jpg",
            merchant_id.as_str().to_lowercase()
        ))
        .bind(location.lat)
        .bind(location.long)
        .bind(geo::encode(location))
        .execute(&pool)
        .await?;

        for (name, category, price) in seed.menu {
            sqlx::query(
                "INSERT INTO product (id, merchant_id, name, category, price, image_url) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(ProductId::generate().as_str())
            .bind(merchant_id.as_str())
            .bind(*name)
            .bind(category.as_str())
            .bind(*price)
            .bind("https://img.example.com/menu.jpg")
            .execute(&pool)
            .await?;
        }

        info!(merchant = seed.name, id = %merchant_id, "seeded");
    }

    info!("Seed complete: {} merchants", MERCHANTS.len());
    Ok(())
}

//! Proximity search over the geohash-bucketed catalog.
//!
//! The bucket query is a coarse prefix scan: only merchants hashing into
//! the user's own grid cell are candidates. Candidates are then ranked by
//! exact haversine distance in-process. Neighboring cells are not scanned,
//! so a merchant just across a cell boundary is missed - a stated
//! limitation of the bucketing scheme (see `pronto_core::geo`), not a bug
//! to patch here.

use pronto_core::{Coordinate, geo};

use crate::db::{CatalogStore, NearbyFilters, RepositoryError};
use crate::models::MerchantWithItems;

/// Page size applied when the client sends no limit (or zero).
pub const DEFAULT_LIMIT: u32 = 5;

/// A proximity query: filters plus pagination.
#[derive(Debug, Clone, Default)]
pub struct NearbyQuery {
    pub filters: NearbyFilters,
    pub limit: u32,
    pub offset: u32,
}

/// One page of ranked merchants plus the bucket-wide match count.
#[derive(Debug)]
pub struct NearbyPage {
    /// Merchants ordered by ascending distance from the query point.
    pub data: Vec<MerchantWithItems>,
    /// Count of all filter-matching merchants in the bucket, independent of
    /// pagination.
    pub total: usize,
}

/// The effective page size for an optional client-supplied limit.
#[must_use]
pub const fn effective_limit(limit: Option<u32>) -> u32 {
    match limit {
        None | Some(0) => DEFAULT_LIMIT,
        Some(limit) => limit,
    }
}

/// Proximity search over a catalog store.
pub struct NearbySearch<'a> {
    catalog: &'a dyn CatalogStore,
    prefix_len: usize,
}

impl<'a> NearbySearch<'a> {
    /// Create a search using the given bucket prefix length.
    #[must_use]
    pub const fn new(catalog: &'a dyn CatalogStore, prefix_len: usize) -> Self {
        Self {
            catalog,
            prefix_len,
        }
    }

    /// Rank the user's bucket by true distance and return one page.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] if the catalog store fails.
    pub async fn find_nearby(
        &self,
        user: Coordinate,
        query: &NearbyQuery,
    ) -> Result<NearbyPage, RepositoryError> {
        let hash = geo::encode(user);
        let prefix = geo::bucket_key(&hash, self.prefix_len);

        let candidates = self
            .catalog
            .merchants_in_bucket(prefix, &query.filters)
            .await?;
        let total = candidates.len();

        let mut ranked: Vec<(f64, MerchantWithItems)> = candidates
            .into_iter()
            .map(|entry| (geo::distance_km(user, entry.merchant.location), entry))
            .collect();
        // Ascending by distance; merchant id breaks ties for a stable page order
        ranked.sort_by(|a, b| {
            a.0.total_cmp(&b.0)
                .then_with(|| a.1.merchant.id.cmp(&b.1.merchant.id))
        });

        let data = ranked
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .map(|(_, entry)| entry)
            .collect();

        Ok(NearbyPage { data, total })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryCatalog;
    use crate::models::{Merchant, Product};
    use chrono::Utc;
    use pronto_core::{MerchantCategory, MerchantId, ProductCategory, ProductId};

    const PREFIX_LEN: usize = 3;

    fn merchant(name: &str, lat: f64, long: f64, category: MerchantCategory) -> Merchant {
        let location = Coordinate::new(lat, long);
        Merchant {
            id: MerchantId::generate(),
            name: name.to_owned(),
            category,
            image_url: format!("https://img.example.com/{name}.jpg"),
            location,
            geohash: pronto_core::geo::encode(location),
            created_at: Utc::now(),
        }
    }

    fn product_of(merchant: &Merchant) -> Product {
        Product {
            id: ProductId::generate(),
            merchant_id: merchant.id.clone(),
            name: format!("{} Special", merchant.name),
            category: ProductCategory::Food,
            price: 15_000,
            image_url: "https://img.example.com/special.jpg".to_owned(),
            created_at: Utc::now(),
        }
    }

    fn catalog_around_origin() -> MemoryCatalog {
        let near = merchant("Near", 0.0, 0.01, MerchantCategory::SmallRestaurant);
        let mid = merchant("Mid", 0.0, 0.02, MerchantCategory::BoothKiosk);
        let far = merchant("Far", 0.0, 0.03, MerchantCategory::SmallRestaurant);
        let near_item = product_of(&near);
        MemoryCatalog::new()
            .with_merchant(far, Vec::new())
            .with_merchant(near, vec![near_item])
            .with_merchant(mid, Vec::new())
    }

    fn query(limit: u32, offset: u32) -> NearbyQuery {
        NearbyQuery {
            filters: NearbyFilters::default(),
            limit,
            offset,
        }
    }

    #[tokio::test]
    async fn test_results_are_sorted_by_distance() {
        let catalog = catalog_around_origin();
        let search = NearbySearch::new(&catalog, PREFIX_LEN);

        let page = search
            .find_nearby(Coordinate::new(0.0, 0.0), &query(5, 0))
            .await
            .unwrap();

        let names: Vec<&str> = page.data.iter().map(|e| e.merchant.name.as_str()).collect();
        assert_eq!(names, ["Near", "Mid", "Far"]);
        assert_eq!(page.total, 3);
    }

    #[tokio::test]
    async fn test_page_respects_limit_and_offset() {
        let catalog = catalog_around_origin();
        let search = NearbySearch::new(&catalog, PREFIX_LEN);
        let user = Coordinate::new(0.0, 0.0);

        let page = search.find_nearby(user, &query(2, 0)).await.unwrap();
        assert_eq!(page.data.len(), 2);
        assert_eq!(page.total, 3);

        let page = search.find_nearby(user, &query(2, 2)).await.unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].merchant.name, "Far");
        // Total is unaffected by pagination
        assert_eq!(page.total, 3);
    }

    #[tokio::test]
    async fn test_category_filter_applies_to_total() {
        let catalog = catalog_around_origin();
        let search = NearbySearch::new(&catalog, PREFIX_LEN);

        let page = search
            .find_nearby(
                Coordinate::new(0.0, 0.0),
                &NearbyQuery {
                    filters: NearbyFilters {
                        category: Some("SmallRestaurant".to_owned()),
                        ..NearbyFilters::default()
                    },
                    limit: 5,
                    offset: 0,
                },
            )
            .await
            .unwrap();

        assert_eq!(page.total, 2);
        let names: Vec<&str> = page.data.iter().map(|e| e.merchant.name.as_str()).collect();
        assert_eq!(names, ["Near", "Far"]);
    }

    #[tokio::test]
    async fn test_merchant_without_products_has_empty_items() {
        let catalog = catalog_around_origin();
        let search = NearbySearch::new(&catalog, PREFIX_LEN);

        let page = search
            .find_nearby(Coordinate::new(0.0, 0.0), &query(5, 0))
            .await
            .unwrap();

        assert_eq!(page.data[0].items.len(), 1);
        assert!(page.data[1].items.is_empty());
    }

    #[tokio::test]
    async fn test_empty_bucket_is_an_empty_page() {
        let catalog = catalog_around_origin();
        let search = NearbySearch::new(&catalog, PREFIX_LEN);

        // Nowhere near the seeded merchants
        let page = search
            .find_nearby(Coordinate::new(48.85, 2.35), &query(5, 0))
            .await
            .unwrap();

        assert!(page.data.is_empty());
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_bucket_excludes_neighbor_cell() {
        // ~200m south of the user but across the equator cell boundary, so
        // its hash shares no prefix with the query point's cell
        let across = merchant("Across", -0.001, 0.001, MerchantCategory::SmallRestaurant);
        let catalog = MemoryCatalog::new().with_merchant(across, Vec::new());
        let search = NearbySearch::new(&catalog, PREFIX_LEN);

        let page = search
            .find_nearby(Coordinate::new(0.001, 0.001), &query(5, 0))
            .await
            .unwrap();

        assert!(page.data.is_empty());
        assert_eq!(page.total, 0);
    }

    #[test]
    fn test_effective_limit_defaults_to_five() {
        assert_eq!(effective_limit(None), 5);
        assert_eq!(effective_limit(Some(0)), 5);
        assert_eq!(effective_limit(Some(12)), 12);
    }
}

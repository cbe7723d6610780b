use async_trait::async_trait;
use mosaic::prelude::*;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Asset pool behaviour against in-process listing and image collaborators
#[cfg(test)]
mod asset_pool {
    use super::*;

    /// Hands out `count` previews per call after an optional delay
    struct ListingStub {
        calls: AtomicUsize,
        delay: Duration,
        url: fn(usize) -> String,
    }

    impl ListingStub {
        fn new(delay: Duration, url: fn(usize) -> String) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay,
                url,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PreviewSource for ListingStub {
        async fn list_previews(
            &self,
            count: usize,
            _resume_after_id: Option<&str>,
        ) -> Result<Vec<PreviewRef>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok((0..count)
                .map(|i| {
                    let n = call * count + i;
                    PreviewRef::new((self.url)(n), format!("target-{}", n))
                })
                .collect())
        }
    }

    struct EmptyListing;

    #[async_trait]
    impl PreviewSource for EmptyListing {
        async fn list_previews(
            &self,
            _count: usize,
            _resume_after_id: Option<&str>,
        ) -> Result<Vec<PreviewRef>> {
            Ok(Vec::new())
        }
    }

    struct BrokenListing;

    #[async_trait]
    impl PreviewSource for BrokenListing {
        async fn list_previews(
            &self,
            _count: usize,
            _resume_after_id: Option<&str>,
        ) -> Result<Vec<PreviewRef>> {
            Err(MosaicError::Http {
                status: 503,
                url: "https://api.example.com/previews".to_string(),
            })
        }
    }

    /// Serves a tiny PNG, fails URLs containing "bad", never answers
    /// URLs containing "hang"
    struct ImageStub {
        fetches: AtomicUsize,
        png: Vec<u8>,
    }

    impl ImageStub {
        fn new() -> Self {
            let mut png = Vec::new();
            image::DynamicImage::ImageRgba8(image::RgbaImage::new(2, 2))
                .write_to(&mut Cursor::new(&mut png), image::ImageOutputFormat::Png)
                .unwrap();
            Self {
                fetches: AtomicUsize::new(0),
                png,
            }
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ImageFetcher for ImageStub {
        async fn fetch(&self, image_url: &str) -> Result<Vec<u8>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if image_url.contains("hang") {
                futures::future::pending::<()>().await;
            }
            if image_url.contains("bad") {
                return Err(MosaicError::Http {
                    status: 404,
                    url: image_url.to_string(),
                });
            }
            Ok(self.png.clone())
        }
    }

    fn good_url(n: usize) -> String {
        format!("mem://good/{}.png", n)
    }

    fn same_url(_n: usize) -> String {
        "mem://good/shared.png".to_string()
    }

    fn odd_bad_url(n: usize) -> String {
        if n % 2 == 1 {
            format!("mem://bad/{}.png", n)
        } else {
            good_url(n)
        }
    }

    fn hang_url(n: usize) -> String {
        format!("mem://hang/{}.png", n)
    }

    /// `n` fresh tiles taken from the initial fill of a throwaway grid
    fn fresh_tiles(n: usize) -> Vec<TileHandle<TileMetadata>> {
        let mut grid = TileGrid::new(MosaicConfig::default().grid(), TileMetadata::default());
        let events = grid.subscribe_lifecycle();
        grid.init(150.0, Point::new(800.0, 600.0));
        let mut tiles = events.try_recv().unwrap().tiles;
        tiles.truncate(n);
        assert_eq!(tiles.len(), n);
        tiles
    }

    async fn wait_for(tiles: &[TileHandle<TileMetadata>], done: impl Fn(&Tile<TileMetadata>) -> bool) {
        for _ in 0..200 {
            if tiles.iter().all(|tile| done(&**tile)) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("tiles did not settle: {:?}", tiles);
    }

    fn config(batch_size: usize) -> PoolConfig {
        PoolConfig {
            batch_size,
            ..PoolConfig::default()
        }
    }

    #[tokio::test]
    async fn test_concurrent_batches_share_one_refill() {
        let listing = Arc::new(ListingStub::new(Duration::from_millis(30), good_url));
        let images = Arc::new(ImageStub::new());
        let pool = AssetPool::new(listing.clone(), images.clone(), config(10));

        let first = fresh_tiles(3);
        let second = fresh_tiles(3);
        let (a, b) = futures::join!(pool.assign_blocks(&first), pool.assign_blocks(&second));

        assert_eq!(a.unwrap(), 3);
        assert_eq!(b.unwrap(), 3);
        assert_eq!(listing.calls(), 1);
        assert_eq!(pool.queued(), 4);

        let mut targets: Vec<String> = first
            .iter()
            .chain(second.iter())
            .filter_map(|tile| tile.metadata().target_id)
            .collect();
        targets.sort();
        targets.dedup();
        assert_eq!(targets.len(), 6);
    }

    #[tokio::test]
    async fn test_starved_pool_errors_whole_batch() {
        let images = Arc::new(ImageStub::new());
        let pool = AssetPool::new(Arc::new(EmptyListing), images.clone(), config(10));

        let tiles = fresh_tiles(5);
        let result = pool.assign_blocks(&tiles).await;

        match result {
            Err(MosaicError::Starvation {
                requested,
                available,
            }) => {
                assert_eq!(requested, 5);
                assert_eq!(available, 0);
            }
            other => panic!("expected starvation, got {:?}", other),
        }

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(tiles.iter().all(|tile| tile.state() == TileState::Errored));
        assert!(tiles.iter().all(|tile| tile.metadata().image_url.is_none()));
        assert_eq!(images.fetches(), 0);
    }

    #[tokio::test]
    async fn test_refill_failure_errors_whole_batch() {
        let images = Arc::new(ImageStub::new());
        let pool = AssetPool::new(Arc::new(BrokenListing), images.clone(), config(10));

        let tiles = fresh_tiles(4);
        let result = pool.assign_blocks(&tiles).await;

        assert!(matches!(result, Err(MosaicError::Refill(_))));
        assert!(tiles.iter().all(|tile| tile.state() == TileState::Errored));
        assert_eq!(images.fetches(), 0);
    }

    #[tokio::test]
    async fn test_fetched_images_make_tiles_ready() {
        let listing = Arc::new(ListingStub::new(Duration::ZERO, good_url));
        let images = Arc::new(ImageStub::new());
        let pool = AssetPool::new(listing, images.clone(), config(10));

        let tiles = fresh_tiles(6);
        pool.assign_blocks(&tiles).await.unwrap();
        wait_for(&tiles, |tile| tile.state() == TileState::Ready).await;

        assert!(tiles.iter().all(|tile| tile.has_image()));
        assert!(tiles[0].with_image(|image| image.map(|i| i.dimensions()) == Some((2, 2))));
        assert_eq!(images.fetches(), 6);
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_sibling_tiles_alone() {
        let listing = Arc::new(ListingStub::new(Duration::ZERO, odd_bad_url));
        let images = Arc::new(ImageStub::new());
        let pool = AssetPool::new(listing, images.clone(), config(10));

        let tiles = fresh_tiles(4);
        pool.assign_blocks(&tiles).await.unwrap();
        wait_for(&tiles, |tile| tile.state() != TileState::New).await;
        wait_for(&tiles[0..1], |tile| tile.state() == TileState::Ready).await;
        wait_for(&tiles[2..3], |tile| tile.state() == TileState::Ready).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(tiles[1].state(), TileState::Downloading);
        assert_eq!(tiles[3].state(), TileState::Downloading);
        assert!(!tiles[1].has_image());
    }

    #[tokio::test]
    async fn test_fetch_failure_can_mark_errored() {
        let listing = Arc::new(ListingStub::new(Duration::ZERO, odd_bad_url));
        let images = Arc::new(ImageStub::new());
        let pool = AssetPool::new(
            listing,
            images,
            PoolConfig {
                mark_fetch_failures_errored: true,
                ..config(10)
            },
        );

        let tiles = fresh_tiles(2);
        pool.assign_blocks(&tiles).await.unwrap();
        wait_for(&tiles[1..2], |tile| tile.state() == TileState::Errored).await;
        wait_for(&tiles[0..1], |tile| tile.state() == TileState::Ready).await;
    }

    #[tokio::test]
    async fn test_hung_fetch_times_out_when_configured() {
        let listing = Arc::new(ListingStub::new(Duration::ZERO, hang_url));
        let pool = AssetPool::new(
            listing.clone(),
            Arc::new(ImageStub::new()),
            PoolConfig {
                fetch_timeout: Some(Duration::from_millis(20)),
                mark_fetch_failures_errored: true,
                ..config(10)
            },
        );

        let tiles = fresh_tiles(1);
        pool.assign_blocks(&tiles).await.unwrap();
        wait_for(&tiles, |tile| tile.state() == TileState::Errored).await;
    }

    #[tokio::test]
    async fn test_hung_fetch_stays_downloading_by_default() {
        let listing = Arc::new(ListingStub::new(Duration::ZERO, hang_url));
        let pool = AssetPool::new(listing, Arc::new(ImageStub::new()), config(10));

        let tiles = fresh_tiles(1);
        pool.assign_blocks(&tiles).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(tiles[0].state(), TileState::Downloading);
    }

    #[tokio::test]
    async fn test_repeated_url_served_from_cache() {
        let listing = Arc::new(ListingStub::new(Duration::ZERO, same_url));
        let images = Arc::new(ImageStub::new());
        let pool = AssetPool::new(listing, images.clone(), config(10));

        let first = fresh_tiles(1);
        pool.assign_blocks(&first).await.unwrap();
        wait_for(&first, |tile| tile.state() == TileState::Ready).await;

        let second = fresh_tiles(1);
        pool.assign_blocks(&second).await.unwrap();
        wait_for(&second, |tile| tile.state() == TileState::Ready).await;

        assert_eq!(images.fetches(), 1);
        assert!(pool.cache().contains("mem://good/shared.png"));
    }

    #[tokio::test]
    async fn test_removed_tiles_are_never_fetched() {
        let listing = Arc::new(ListingStub::new(Duration::ZERO, good_url));
        let images = Arc::new(ImageStub::new());
        let pool = AssetPool::new(listing, images.clone(), config(10));

        let mut grid = TileGrid::new(MosaicConfig::default().grid(), TileMetadata::default());
        let events = grid.subscribe_lifecycle();
        grid.init(150.0, Point::new(800.0, 600.0));
        grid.shift_origin(Point::new(-4000.0, 0.0), BoundsCheck::Run);

        let removed: Vec<TileHandle<TileMetadata>> = events
            .try_iter()
            .filter(|event| event.new_state == TileState::Removed)
            .flat_map(|event| event.tiles)
            .take(3)
            .collect();
        assert_eq!(removed.len(), 3);

        pool.assign_blocks(&removed).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(images.fetches(), 0);
        assert!(removed.iter().all(|tile| tile.state() == TileState::Removed));
        assert!(removed.iter().all(|tile| !tile.has_image()));
    }
}

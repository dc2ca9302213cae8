//! Raster tile base layer.
//!
//! Tiles are downloaded and decoded on a worker thread. The draw callback
//! polls finished tiles and turns them into cairo surfaces on the main
//! thread, since surfaces cannot cross threads. Queued requests for a zoom
//! level the view has already left are skipped rather than fetched.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;

use gtk4::{
    cairo::{Context, Error as CairoError, Format, ImageSurface},
    prelude::WidgetExt,
    DrawingArea,
};
use tracing::{debug, warn};

use crate::{
    error::{Error, Result},
    feed::FeedClient,
    geometry::{FocusRange, Rect, MAX_ZOOM},
    window::Layer,
};

/// Beyond this many tiles, tiles of other zoom levels are dropped.
const MAX_TILES: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub fn new(z: u8, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Expands `{s}`, `{z}`, `{x}`, `{y}` and `{r}` in a tile URL template.
    pub fn url<S: AsRef<str>>(&self, template: &str, subdomains: &[S]) -> String {
        let subdomain = if subdomains.is_empty() {
            ""
        } else {
            subdomains[(self.x as usize + self.y as usize) % subdomains.len()].as_ref()
        };
        template
            .replace("{s}", subdomain)
            .replace("{z}", &self.z.to_string())
            .replace("{x}", &self.x.to_string())
            .replace("{y}", &self.y.to_string())
            .replace("{r}", "")
    }

    /// World rectangle covered by this tile.
    pub fn bounds(&self) -> Rect {
        let size = 1.0 / (1u64 << self.z) as f64;
        Rect::new(
            self.x as f64 * size,
            self.y as f64 * size,
            (self.x + 1) as f64 * size,
            (self.y + 1) as f64 * size,
        )
    }
}

/// Tile zoom level for a continuous view zoom.
pub fn tile_zoom(zoom: f64) -> u8 {
    zoom.round().clamp(0.0, MAX_ZOOM) as u8
}

/// Tiles of level `z` intersecting `rect`, row by row.
pub fn visible_tiles(rect: &Rect, z: u8) -> Vec<TileCoord> {
    let n = (1u64 << z) as f64;
    let x0 = (rect.min_x * n).floor().clamp(0.0, n) as u32;
    let x1 = (rect.max_x * n).ceil().clamp(0.0, n) as u32;
    let y0 = (rect.min_y * n).floor().clamp(0.0, n) as u32;
    let y1 = (rect.max_y * n).ceil().clamp(0.0, n) as u32;

    (y0..y1)
        .flat_map(|y| (x0..x1).map(move |x| TileCoord::new(z, x, y)))
        .collect()
}

/// A decoded tile in cairo's premultiplied native-endian ARGB32 layout.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedTile {
    pub width: i32,
    pub height: i32,
    pub data: Vec<u8>,
}

impl DecodedTile {
    pub fn from_rgba(width: u32, height: u32, rgba: &[u8]) -> Self {
        let data = rgba
            .chunks_exact(4)
            .flat_map(|px| {
                let a = px[3] as u32;
                let premultiply = |c: u8| (c as u32 * a + 127) / 255;
                let argb = (a << 24)
                    | (premultiply(px[0]) << 16)
                    | (premultiply(px[1]) << 8)
                    | premultiply(px[2]);
                argb.to_ne_bytes()
            })
            .collect();
        Self {
            width: width as i32,
            height: height as i32,
            data,
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes)?.into_rgba8();
        let (width, height) = image.dimensions();
        Ok(Self::from_rgba(width, height, image.as_raw()))
    }

    fn into_surface(self) -> std::result::Result<ImageSurface, CairoError> {
        let stride = self.width * 4;
        ImageSurface::create_for_data(self.data, Format::ARgb32, self.width, self.height, stride)
    }
}

enum TileOutcome {
    Fetched(Result<DecodedTile>),
    /// The view moved to another zoom level before the request was served.
    Skipped,
}

type TileResult = (TileCoord, TileOutcome);

/// Serves tile requests in order, fetching only those at the zoom level in
/// `current_zoom`. Returns once `requests` ends or nobody listens for results.
fn serve_requests<I, F>(
    requests: I,
    current_zoom: &AtomicU8,
    mut fetch: F,
    results: &Sender<TileResult>,
) where
    I: IntoIterator<Item = TileCoord>,
    F: FnMut(TileCoord) -> Result<DecodedTile>,
{
    for coord in requests {
        let outcome = if coord.z == current_zoom.load(Ordering::Relaxed) {
            TileOutcome::Fetched(fetch(coord))
        } else {
            TileOutcome::Skipped
        };
        if results.send((coord, outcome)).is_err() {
            break;
        }
    }
}

struct TileFetcher {
    requests: Sender<TileCoord>,
    results: Receiver<TileResult>,
    current_zoom: Arc<AtomicU8>,
}

impl TileFetcher {
    fn spawn(client: FeedClient, template: String, subdomains: Vec<String>) -> Result<Self> {
        let (request_tx, request_rx) = mpsc::channel::<TileCoord>();
        let (result_tx, result_rx) = mpsc::channel::<TileResult>();
        let current_zoom = Arc::new(AtomicU8::new(0));

        thread::Builder::new()
            .name("tile-fetcher".into())
            .spawn({
                let current_zoom = Arc::clone(&current_zoom);
                move || {
                    let fetch = |coord: TileCoord| {
                        let url = coord.url(&template, &subdomains);
                        debug!("fetching tile {url}");
                        client
                            .fetch_bytes(&url)
                            .and_then(|bytes| DecodedTile::decode(&bytes))
                    };
                    serve_requests(request_rx, &current_zoom, fetch, &result_tx);
                }
            })
            .map_err(Error::Spawn)?;

        Ok(Self {
            requests: request_tx,
            results: result_rx,
            current_zoom,
        })
    }
}

enum TileSlot {
    Pending,
    Ready(ImageSurface),
    Failed,
}

pub struct TileLayer {
    fetcher: TileFetcher,
    attribution: String,
    tiles: RefCell<HashMap<TileCoord, TileSlot>>,
}

impl TileLayer {
    pub fn new(
        client: FeedClient,
        template: &str,
        subdomains: &[String],
        attribution: &str,
    ) -> Result<Self> {
        let fetcher = TileFetcher::spawn(client, template.to_string(), subdomains.to_vec())?;
        Ok(Self {
            fetcher,
            attribution: attribution.to_string(),
            tiles: RefCell::new(HashMap::new()),
        })
    }

    fn receive_finished(&self) {
        let mut tiles = self.tiles.borrow_mut();
        loop {
            match self.fetcher.results.try_recv() {
                Ok((coord, TileOutcome::Fetched(Ok(tile)))) => match tile.into_surface() {
                    Ok(surface) => {
                        tiles.insert(coord, TileSlot::Ready(surface));
                    }
                    Err(err) => {
                        warn!("tile {coord:?} could not become a surface: {err}");
                        tiles.insert(coord, TileSlot::Failed);
                    }
                },
                Ok((coord, TileOutcome::Fetched(Err(err)))) => {
                    warn!("tile {coord:?} failed: {err}");
                    tiles.insert(coord, TileSlot::Failed);
                }
                Ok((coord, TileOutcome::Skipped)) => {
                    // Requested again if it comes back into view.
                    if matches!(tiles.get(&coord), Some(TileSlot::Pending)) {
                        tiles.remove(&coord);
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    debug!("tile fetcher stopped");
                    break;
                }
            }
        }
    }

    fn prune(&self, z: u8) {
        let mut tiles = self.tiles.borrow_mut();
        if tiles.len() > MAX_TILES {
            tiles.retain(|coord, slot| coord.z == z || matches!(slot, TileSlot::Pending));
        }
    }

    fn draw_attribution(
        &self,
        drawing_area: &DrawingArea,
        cr: &Context,
    ) -> std::result::Result<(), CairoError> {
        if self.attribution.is_empty() {
            return Ok(());
        }
        cr.set_font_size(11.0);
        let extents = cr.text_extents(&self.attribution)?;
        let height = drawing_area.height() as f64;

        cr.set_source_rgba(1.0, 1.0, 1.0, 0.7);
        cr.rectangle(0.0, height - 18.0, extents.x_advance() + 12.0, 18.0);
        cr.fill()?;
        cr.set_source_rgb(0.2, 0.2, 0.2);
        cr.move_to(6.0, height - 5.0);
        cr.show_text(&self.attribution)
    }
}

impl Layer for TileLayer {
    fn draw(
        &self,
        drawing_area: &DrawingArea,
        cr: &Context,
        focus_range: &FocusRange,
    ) -> std::result::Result<(), CairoError> {
        self.receive_finished();

        let area_width = drawing_area.width() as f64;
        let area_height = drawing_area.height() as f64;
        let rect = focus_range.to_rect(area_width, area_height);
        let z = tile_zoom(focus_range.zoom());
        self.fetcher.current_zoom.store(z, Ordering::Relaxed);
        self.prune(z);

        let mut tiles = self.tiles.borrow_mut();
        for coord in visible_tiles(&rect, z) {
            match tiles.get(&coord) {
                Some(TileSlot::Ready(surface)) => {
                    let bounds = coord.bounds();
                    let x = rect.map_coord_x(bounds.min_x, 0.0, area_width);
                    let y = rect.map_coord_y(bounds.min_y, 0.0, area_height);
                    let size = bounds.width() * focus_range.scale();
                    let scale = size / surface.width().max(1) as f64;

                    cr.save()?;
                    cr.translate(x, y);
                    cr.scale(scale, scale);
                    cr.set_source_surface(surface, 0.0, 0.0)?;
                    cr.paint()?;
                    cr.restore()?;
                }
                Some(TileSlot::Pending) | Some(TileSlot::Failed) => {}
                None => {
                    if self.fetcher.requests.send(coord).is_ok() {
                        tiles.insert(coord, TileSlot::Pending);
                    }
                }
            }
        }
        drop(tiles);

        self.draw_attribution(drawing_area, cr)
    }
}

//! In-memory collaborators for exercising the selection and lookup flow.

use std::cell::RefCell;
use std::rc::Rc;

use futures::channel::oneshot;
use futures::executor::LocalPool;
use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;
use regioni_shared::Geometry;

use crate::fetch::{InfoService, LookupResponse, Spawner};
use crate::highlight::MapSurface;
use crate::panel::{PanelSink, PanelView};
use crate::registry::{LayerId, Rgb};

#[derive(Debug, Default)]
pub struct RecordingSurface {
    fills: Vec<Rgb>,
    writes: usize,
}

impl RecordingSurface {
    pub fn fill(&self, layer: LayerId) -> Rgb {
        self.fills[layer.0]
    }

    /// Number of `set_fill` calls so far.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl MapSurface for RecordingSurface {
    fn add_layer(&mut self, _name: &str, _geometry: &Geometry, fill: Rgb) -> LayerId {
        self.fills.push(fill);
        LayerId(self.fills.len() - 1)
    }

    fn set_fill(&mut self, layer: LayerId, fill: Rgb) {
        self.fills[layer.0] = fill;
        self.writes += 1;
    }
}

#[derive(Debug, Default)]
pub struct RecordingPanel {
    views: RefCell<Vec<PanelView>>,
}

impl RecordingPanel {
    pub fn last(&self) -> Option<PanelView> {
        self.views.borrow().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.views.borrow().len()
    }
}

impl PanelSink for RecordingPanel {
    fn show(&self, view: PanelView) {
        self.views.borrow_mut().push(view);
    }
}

type Reply = Result<LookupResponse, String>;

/// Lookup service whose replies are released by the test, in any order.
#[derive(Default)]
pub struct ScriptedService {
    calls: RefCell<Vec<String>>,
    pending: RefCell<Vec<(String, oneshot::Sender<Reply>)>>,
}

impl ScriptedService {
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Release the oldest outstanding lookup for `region`.
    pub fn resolve(&self, region: &str, reply: Reply) {
        let mut pending = self.pending.borrow_mut();
        let idx = pending
            .iter()
            .position(|(name, _)| name == region)
            .unwrap_or_else(|| panic!("no outstanding lookup for {region}"));
        let (_, tx) = pending.remove(idx);
        let _ = tx.send(reply);
    }
}

impl InfoService for ScriptedService {
    fn lookup(&self, region: &str) -> LocalBoxFuture<'static, Reply> {
        let (tx, rx) = oneshot::channel();
        self.calls.borrow_mut().push(region.to_owned());
        self.pending.borrow_mut().push((region.to_owned(), tx));
        Box::pin(async move {
            rx.await
                .unwrap_or_else(|_| Err("lookup abandoned".to_string()))
        })
    }
}

pub fn local_spawner(pool: &LocalPool) -> Spawner {
    let spawner = pool.spawner();
    Rc::new(move |future: LocalBoxFuture<'static, ()>| {
        spawner
            .spawn_local(future)
            .expect("local pool accepts tasks");
    })
}

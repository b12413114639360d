use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use parking_lot::Mutex;
use tokio::{sync::watch, task::JoinHandle};

use super::prelude::*;
use crate::{gateways::geocode::GeoCodingGateway, util::validate::AutoCorrect};

pub type AddressState = ResponseState<Address>;

/// Reverse geocoding with last-write-wins semantics.
///
/// Every submitted position gets a sequence number. A response is only
/// published if no newer position has been submitted in the meantime.
pub struct AddressLookup<G> {
    gateway: Arc<G>,
    state: Arc<watch::Sender<AddressState>>,
    settled: Arc<Mutex<AddressState>>,
    latest: Arc<AtomicU64>,
}

impl<G> Clone for AddressLookup<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            state: Arc::clone(&self.state),
            settled: Arc::clone(&self.settled),
            latest: Arc::clone(&self.latest),
        }
    }
}

impl<G> std::fmt::Debug for AddressLookup<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressLookup")
            .field("state", &*self.state.borrow())
            .field("latest", &self.latest.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl<G> AddressLookup<G>
where
    G: GeoCodingGateway + Send + Sync + 'static,
{
    pub fn new(gateway: Arc<G>) -> Self {
        let (state, _) = watch::channel(AddressState::Idle);
        Self {
            gateway,
            state: Arc::new(state),
            settled: Arc::new(Mutex::new(AddressState::Idle)),
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn state(&self) -> AddressState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AddressState> {
        self.state.subscribe()
    }

    /// The last published outcome, `Idle` if there is none.
    ///
    /// Unlike [`Self::state`] this keeps the previous result while a
    /// newer lookup is loading.
    pub fn settled(&self) -> AddressState {
        self.settled.lock().clone()
    }

    /// Start resolving the address of `pos`.
    ///
    /// The state switches to `Loading` before this function returns.
    /// The returned handle completes after the response has either been
    /// published or discarded as stale.
    pub fn submit(&self, pos: Coordinate) -> JoinHandle<()> {
        let mut seq = 0;
        self.state.send_modify(|state| {
            seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
            *state = AddressState::Loading;
        });
        log::debug!("Looking up address #{seq} for {pos}");
        let gateway = Arc::clone(&self.gateway);
        let state = Arc::clone(&self.state);
        let settled = Arc::clone(&self.settled);
        let latest = Arc::clone(&self.latest);
        tokio::spawn(async move {
            let next = AddressState::from(lookup(&*gateway, pos).await);
            let published = state.send_if_modified(|current| {
                if latest.load(Ordering::SeqCst) != seq {
                    return false;
                }
                *settled.lock() = next.clone();
                *current = next;
                true
            });
            if !published {
                log::debug!("Discarding stale address #{seq} for {pos}");
            }
        })
    }

    /// Back to `Idle`, responses still in flight are discarded.
    pub fn reset(&self) {
        self.state.send_modify(|state| {
            self.latest.fetch_add(1, Ordering::SeqCst);
            *self.settled.lock() = AddressState::Idle;
            *state = AddressState::Idle;
        });
    }
}

async fn lookup<G>(gateway: &G, pos: Coordinate) -> Result<Address>
where
    G: GeoCodingGateway,
{
    let addresses = gateway.reverse_geocode(pos).await.map_err(|err| {
        log::warn!("Error fetching address for {pos}: {err:#}");
        Error::provider_fault(&err)
    })?;
    // only the best match counts, even if it carries no data
    addresses
        .into_iter()
        .next()
        .map(AutoCorrect::auto_correct)
        .filter(|addr| !addr.is_empty())
        .ok_or_else(|| {
            log::info!("No address found for {pos}");
            Error::NoResultFound
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::tests::*;
    use geopick_entities::builders::*;

    #[tokio::test]
    async fn lookup_cycle() {
        let gw = Arc::new(FakeGeoCoding::default());
        let lookup = AddressLookup::new(Arc::clone(&gw));
        assert!(lookup.state().is_idle());

        let task = lookup.submit(ranchi());
        assert!(lookup.state().is_loading());
        task.await.unwrap();
        assert_eq!(lookup.state(), AddressState::Success(ranchi_address()));
        assert_eq!(gw.call_count(), 1);
    }

    #[tokio::test]
    async fn first_candidate_wins() {
        let gw = Arc::new(FakeGeoCoding::with_addresses(vec![
            Address::build().line("first").finish(),
            Address::build().line("second").finish(),
        ]));
        let lookup = AddressLookup::new(gw);
        lookup.submit(ranchi()).await.unwrap();
        let state = lookup.state();
        let addr = state.success().unwrap();
        assert_eq!(addr.line.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn empty_first_candidate_is_no_result() {
        let gw = Arc::new(FakeGeoCoding::with_addresses(vec![
            Address::build().line("  ").finish(),
            Address::build().line("second").finish(),
        ]));
        let lookup = AddressLookup::new(gw);
        lookup.submit(ranchi()).await.unwrap();
        assert_eq!(lookup.state(), AddressState::Error(Error::NoResultFound));
    }

    #[tokio::test]
    async fn settled_state_survives_loading() {
        let gw = Arc::new(GatedGeoCoding::default());
        let lookup = AddressLookup::new(Arc::clone(&gw));
        assert!(lookup.settled().is_idle());
        let first = gw.gate();
        let second = gw.gate();

        let task = lookup.submit(ranchi());
        assert!(lookup.settled().is_idle());
        first.send(Ok(vec![ranchi_address()])).unwrap();
        task.await.unwrap();
        assert_eq!(lookup.settled(), AddressState::Success(ranchi_address()));

        let task = lookup.submit(berlin());
        assert!(lookup.state().is_loading());
        assert_eq!(lookup.settled(), AddressState::Success(ranchi_address()));
        second.send(Err("offline".to_string())).unwrap();
        task.await.unwrap();
        assert!(lookup.settled().error().is_some());

        lookup.reset();
        assert!(lookup.settled().is_idle());
    }

    #[tokio::test]
    async fn empty_result_is_an_error() {
        let gw = Arc::new(FakeGeoCoding::with_addresses(vec![]));
        let lookup = AddressLookup::new(gw);
        lookup.submit(ranchi()).await.unwrap();
        assert_eq!(lookup.state(), AddressState::Error(Error::NoResultFound));
    }

    #[tokio::test]
    async fn provider_fault_is_an_error() {
        let gw = Arc::new(FakeGeoCoding::failing("service unavailable"));
        let lookup = AddressLookup::new(Arc::clone(&gw));
        lookup.submit(ranchi()).await.unwrap();
        assert_eq!(
            lookup.state(),
            AddressState::Error(Error::NetworkOrProviderFault(
                "service unavailable".to_string()
            ))
        );
        // retry by submitting again
        gw.set(Ok(vec![ranchi_address()]));
        let task = lookup.submit(ranchi());
        assert!(lookup.state().is_loading());
        task.await.unwrap();
        assert_eq!(lookup.state(), AddressState::Success(ranchi_address()));
    }

    #[tokio::test]
    async fn same_position_twice_runs_two_cycles() {
        let gw = Arc::new(FakeGeoCoding::default());
        let lookup = AddressLookup::new(Arc::clone(&gw));
        for _ in 0..2 {
            let task = lookup.submit(ranchi());
            assert!(lookup.state().is_loading());
            task.await.unwrap();
            assert_eq!(lookup.state(), AddressState::Success(ranchi_address()));
        }
        assert_eq!(gw.call_count(), 2);
    }

    #[tokio::test]
    async fn stale_response_is_discarded() {
        let gw = Arc::new(GatedGeoCoding::default());
        let lookup = AddressLookup::new(Arc::clone(&gw));
        let first = gw.gate();
        let second = gw.gate();

        let first_task = lookup.submit(ranchi());
        let second_task = lookup.submit(berlin());

        // the newer request completes first
        second.send(Ok(vec![berlin_address()])).unwrap();
        second_task.await.unwrap();
        assert_eq!(lookup.state(), AddressState::Success(berlin_address()));

        first.send(Ok(vec![ranchi_address()])).unwrap();
        first_task.await.unwrap();
        assert_eq!(lookup.state(), AddressState::Success(berlin_address()));
    }

    #[tokio::test]
    async fn stale_response_arriving_first_is_discarded() {
        let gw = Arc::new(GatedGeoCoding::default());
        let lookup = AddressLookup::new(Arc::clone(&gw));
        let first = gw.gate();
        let second = gw.gate();

        let first_task = lookup.submit(ranchi());
        let second_task = lookup.submit(berlin());

        first.send(Ok(vec![ranchi_address()])).unwrap();
        first_task.await.unwrap();
        assert!(lookup.state().is_loading());

        second.send(Ok(vec![berlin_address()])).unwrap();
        second_task.await.unwrap();
        assert_eq!(lookup.state(), AddressState::Success(berlin_address()));
    }

    #[tokio::test]
    async fn stale_error_is_discarded() {
        let gw = Arc::new(GatedGeoCoding::default());
        let lookup = AddressLookup::new(Arc::clone(&gw));
        let first = gw.gate();
        let second = gw.gate();

        let first_task = lookup.submit(ranchi());
        let second_task = lookup.submit(berlin());

        second.send(Ok(vec![berlin_address()])).unwrap();
        second_task.await.unwrap();
        first.send(Err("timeout".to_string())).unwrap();
        first_task.await.unwrap();
        assert_eq!(lookup.state(), AddressState::Success(berlin_address()));
    }

    #[tokio::test]
    async fn reset_discards_pending_response() {
        let gw = Arc::new(GatedGeoCoding::default());
        let lookup = AddressLookup::new(Arc::clone(&gw));
        let gate = gw.gate();
        let task = lookup.submit(ranchi());
        lookup.reset();
        gate.send(Ok(vec![ranchi_address()])).unwrap();
        task.await.unwrap();
        assert!(lookup.state().is_idle());
    }
}

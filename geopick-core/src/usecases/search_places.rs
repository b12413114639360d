use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use parking_lot::Mutex;
use tokio::{
    sync::{broadcast, watch},
    task::JoinHandle,
};

use super::prelude::*;
use crate::{gateways::places::PlacesGateway, util::validate::is_searchable_query};

const EVENT_CAPACITY: usize = 16;

/// Snapshot of the search field and its suggestions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaceSearch {
    pub query: String,
    pub predictions: Vec<PlacePrediction>,
    pub searching: bool,
}

/// Transient notifications that are not part of the search state.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    Error(Error),
    Selected(PlaceDetails),
}

/// Search-as-you-type against a places provider.
///
/// All autocomplete requests between the first keystroke and a
/// completed selection (or clearing the field) share one session token.
pub struct PlaceSearchSession<G> {
    gateway: Arc<G>,
    state: Arc<watch::Sender<PlaceSearch>>,
    latest: Arc<AtomicU64>,
    selected: Arc<AtomicU64>,
    token: Arc<Mutex<Option<SessionToken>>>,
    events: broadcast::Sender<SearchEvent>,
}

impl<G> Clone for PlaceSearchSession<G> {
    fn clone(&self) -> Self {
        Self {
            gateway: Arc::clone(&self.gateway),
            state: Arc::clone(&self.state),
            latest: Arc::clone(&self.latest),
            selected: Arc::clone(&self.selected),
            token: Arc::clone(&self.token),
            events: self.events.clone(),
        }
    }
}

impl<G> std::fmt::Debug for PlaceSearchSession<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaceSearchSession")
            .field("state", &*self.state.borrow())
            .field("token", &*self.token.lock())
            .finish_non_exhaustive()
    }
}

impl<G> PlaceSearchSession<G>
where
    G: PlacesGateway + Send + Sync + 'static,
{
    pub fn new(gateway: Arc<G>) -> Self {
        let (state, _) = watch::channel(PlaceSearch::default());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            gateway,
            state: Arc::new(state),
            latest: Arc::new(AtomicU64::new(0)),
            selected: Arc::new(AtomicU64::new(0)),
            token: Arc::new(Mutex::new(None)),
            events,
        }
    }

    pub fn state(&self) -> PlaceSearch {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PlaceSearch> {
        self.state.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<SearchEvent> {
        self.events.subscribe()
    }

    /// The token of the running session, if any.
    pub fn session_token(&self) -> Option<SessionToken> {
        self.token.lock().clone()
    }

    /// React on a changed search field.
    ///
    /// Returns the handle of the spawned autocomplete request or `None`
    /// if the query is too short to be sent.
    pub fn on_query_changed(&self, text: &str) -> Option<JoinHandle<()>> {
        if !is_searchable_query(text) {
            self.state.send_modify(|state| {
                self.latest.fetch_add(1, Ordering::SeqCst);
                state.query = text.to_owned();
                state.predictions.clear();
                state.searching = false;
            });
            if text.is_empty() {
                self.end_session();
            }
            return None;
        }
        let token = self.token.lock().get_or_insert_with(SessionToken::new).clone();
        let mut seq = 0;
        self.state.send_modify(|state| {
            seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
            state.query = text.to_owned();
            state.searching = true;
        });
        log::debug!("Searching places #{seq} for '{text}'");
        let query = text.to_owned();
        let gateway = Arc::clone(&self.gateway);
        let state = Arc::clone(&self.state);
        let latest = Arc::clone(&self.latest);
        let events = self.events.clone();
        Some(tokio::spawn(async move {
            let result = gateway.find_predictions(&query, &token).await;
            let mut failure = None;
            let published = state.send_if_modified(|current| {
                if latest.load(Ordering::SeqCst) != seq {
                    return false;
                }
                current.searching = false;
                match result {
                    Ok(predictions) => {
                        if predictions.is_empty() {
                            failure = Some(Error::NoResultFound);
                        }
                        current.predictions = predictions;
                    }
                    Err(err) => {
                        log::warn!("Place prediction failed: {err:#}");
                        failure = Some(Error::provider_fault(&err));
                    }
                }
                true
            });
            if !published {
                log::debug!("Discarding stale predictions #{seq} for '{query}'");
            }
            if let Some(err) = failure {
                // Nobody listening is fine.
                let _ = events.send(SearchEvent::Error(err));
            }
        }))
    }

    /// Resolve a selected prediction into a position.
    ///
    /// On success the suggestions are dismissed, the search field shows
    /// the name of the place and the session ends. On failure the state
    /// stays as it is.
    ///
    /// If another selection started in the meantime the outcome is
    /// returned but neither applied nor announced.
    pub async fn on_prediction_selected(&self, id: &str) -> Result<Coordinate> {
        let seq = self.selected.fetch_add(1, Ordering::SeqCst) + 1;
        let token = self.session_token();
        let details = match self.gateway.fetch_place_details(id, token.as_ref()).await {
            Ok(details) => details,
            Err(err) => {
                log::warn!("Place details failed: {err:#}");
                let err = Error::provider_fault(&err);
                if self.selected.load(Ordering::SeqCst) == seq {
                    let _ = self.events.send(SearchEvent::Error(err.clone()));
                }
                return Err(err);
            }
        };
        let pos = details.pos;
        let applied = self.state.send_if_modified(|state| {
            if self.selected.load(Ordering::SeqCst) != seq {
                return false;
            }
            self.latest.fetch_add(1, Ordering::SeqCst);
            state.query = details.name.clone().unwrap_or_default();
            state.predictions.clear();
            state.searching = false;
            true
        });
        if !applied {
            log::debug!("Discarding stale selection #{seq} of place {}", details.id);
            return Ok(pos);
        }
        log::debug!("Selected place {} at {pos}", details.id);
        self.end_session();
        let _ = self.events.send(SearchEvent::Selected(details));
        Ok(pos)
    }

    /// Empty the search field and end the session.
    pub fn clear(&self) {
        self.on_query_changed("");
    }

    fn end_session(&self) {
        if let Some(token) = self.token.lock().take() {
            log::debug!("Search session {token} ended");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::tests::*;
    use geopick_entities::builders::*;

    fn ranchi_prediction() -> PlacePrediction {
        PlacePrediction::build()
            .id("p1")
            .primary_text("Ranchi")
            .secondary_text("Jharkhand, India")
            .finish()
    }

    #[tokio::test]
    async fn short_query_clears_predictions_without_request() {
        let gw = Arc::new(FakePlaces::with_predictions(vec![ranchi_prediction()]));
        let search = PlaceSearchSession::new(Arc::clone(&gw));

        search.on_query_changed("Ran").unwrap().await.unwrap();
        assert_eq!(search.state().predictions.len(), 1);

        assert!(search.on_query_changed("Ra").is_none());
        let state = search.state();
        assert!(state.predictions.is_empty());
        assert!(!state.searching);
        assert_eq!(state.query, "Ra");
        assert_eq!(gw.prediction_calls().len(), 1);
    }

    #[tokio::test]
    async fn short_query_discards_request_in_flight() {
        let gw = Arc::new(GatedPlaces::default());
        let search = PlaceSearchSession::new(Arc::clone(&gw));
        let gate = gw.gate();

        let task = search.on_query_changed("Ran").unwrap();
        assert!(search.state().searching);
        assert!(search.on_query_changed("R").is_none());
        assert!(!search.state().searching);

        gate.send(Ok(vec![ranchi_prediction()])).unwrap();
        task.await.unwrap();
        let state = search.state();
        assert!(state.predictions.is_empty());
        assert!(!state.searching);
    }

    #[tokio::test]
    async fn predictions_keep_provider_order() {
        let predictions = vec![
            PlacePrediction::build().id("b").primary_text("Ranchi Hill").finish(),
            PlacePrediction::build().id("a").primary_text("Ranchi").finish(),
        ];
        let gw = Arc::new(FakePlaces::with_predictions(predictions.clone()));
        let search = PlaceSearchSession::new(gw);
        let task = search.on_query_changed("Ranc").unwrap();
        assert!(search.state().searching);
        task.await.unwrap();
        let state = search.state();
        assert_eq!(state.predictions, predictions);
        assert!(!state.searching);
    }

    #[tokio::test]
    async fn failed_request_emits_error_event() {
        let gw = Arc::new(FakePlaces::default());
        gw.fail_predictions("quota exceeded");
        let search = PlaceSearchSession::new(Arc::clone(&gw));
        let mut events = search.events();

        search.on_query_changed("Ran").unwrap().await.unwrap();
        assert!(!search.state().searching);
        assert_eq!(
            events.recv().await.unwrap(),
            SearchEvent::Error(Error::NetworkOrProviderFault(
                "quota exceeded".to_string()
            ))
        );

        // further queries still work
        gw.set_predictions(vec![ranchi_prediction()]);
        search.on_query_changed("Ranc").unwrap().await.unwrap();
        assert_eq!(search.state().predictions, vec![ranchi_prediction()]);
    }

    #[tokio::test]
    async fn empty_result_emits_no_result_found() {
        let gw = Arc::new(FakePlaces::default());
        let search = PlaceSearchSession::new(gw);
        let mut events = search.events();
        search.on_query_changed("xyz").unwrap().await.unwrap();
        assert!(search.state().predictions.is_empty());
        assert_eq!(
            events.recv().await.unwrap(),
            SearchEvent::Error(Error::NoResultFound)
        );
    }

    #[tokio::test]
    async fn latest_query_wins() {
        let gw = Arc::new(GatedPlaces::default());
        let search = PlaceSearchSession::new(Arc::clone(&gw));
        let first = gw.gate();
        let second = gw.gate();

        let first_task = search.on_query_changed("Ran").unwrap();
        let second_task = search.on_query_changed("Ranc").unwrap();

        second.send(Ok(vec![ranchi_prediction()])).unwrap();
        second_task.await.unwrap();
        first
            .send(Ok(vec![PlacePrediction::build().id("p0").finish()]))
            .unwrap();
        first_task.await.unwrap();

        let state = search.state();
        assert_eq!(state.query, "Ranc");
        assert_eq!(state.predictions, vec![ranchi_prediction()]);
        assert!(!state.searching);
    }

    #[tokio::test]
    async fn session_token_is_shared_until_cleared() {
        let gw = Arc::new(FakePlaces::with_predictions(vec![ranchi_prediction()]));
        let search = PlaceSearchSession::new(Arc::clone(&gw));
        assert!(search.session_token().is_none());

        search.on_query_changed("Ran").unwrap().await.unwrap();
        search.on_query_changed("Ranc").unwrap().await.unwrap();
        // a short but non-empty query keeps the session alive
        search.on_query_changed("Ra");
        search.on_query_changed("Ran").unwrap().await.unwrap();
        let calls = gw.prediction_calls();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|(_, token)| *token == calls[0].1));

        search.clear();
        assert!(search.session_token().is_none());
        assert_eq!(search.state(), PlaceSearch::default());

        search.on_query_changed("Ran").unwrap().await.unwrap();
        let calls = gw.prediction_calls();
        assert_ne!(calls[3].1, calls[0].1);
    }

    #[tokio::test]
    async fn selecting_a_prediction() {
        let gw = Arc::new(FakePlaces::with_predictions(vec![ranchi_prediction()]));
        gw.set_details(Ok(ranchi_details()));
        let search = PlaceSearchSession::new(Arc::clone(&gw));
        let mut events = search.events();

        search.on_query_changed("Ran").unwrap().await.unwrap();
        let token = search.session_token();
        assert!(token.is_some());

        let pos = search.on_prediction_selected("p1").await.unwrap();
        assert_eq!(pos, ranchi());
        let state = search.state();
        assert!(state.predictions.is_empty());
        assert_eq!(state.query, "Ranchi");
        assert!(search.session_token().is_none());
        assert_eq!(gw.details_calls(), vec![("p1".to_string(), token)]);
        assert_eq!(
            events.recv().await.unwrap(),
            SearchEvent::Selected(ranchi_details())
        );
    }

    #[tokio::test]
    async fn failed_selection_keeps_state() {
        let gw = Arc::new(FakePlaces::with_predictions(vec![ranchi_prediction()]));
        gw.set_details(Err("not found".to_string()));
        let search = PlaceSearchSession::new(Arc::clone(&gw));
        let mut events = search.events();

        search.on_query_changed("Ran").unwrap().await.unwrap();
        let before = search.state();
        let token = search.session_token();

        let err = search.on_prediction_selected("p1").await.unwrap_err();
        assert_eq!(err, Error::NetworkOrProviderFault("not found".to_string()));
        assert_eq!(search.state(), before);
        assert_eq!(search.session_token(), token);
        assert_eq!(events.recv().await.unwrap(), SearchEvent::Error(err));
    }

    #[tokio::test]
    async fn latest_selection_wins() {
        let gw = Arc::new(GatedPlaces::default());
        let search = PlaceSearchSession::new(Arc::clone(&gw));
        let mut events = search.events();
        let older = gw.gate_details();
        let newer = gw.gate_details();

        let first = tokio::spawn({
            let search = search.clone();
            async move { search.on_prediction_selected("p1").await }
        });
        while gw.details_call_count() < 1 {
            tokio::task::yield_now().await;
        }
        let second = tokio::spawn({
            let search = search.clone();
            async move { search.on_prediction_selected("p2").await }
        });
        while gw.details_call_count() < 2 {
            tokio::task::yield_now().await;
        }

        newer.send(Ok(berlin_details())).unwrap();
        assert_eq!(second.await.unwrap(), Ok(berlin()));
        assert_eq!(search.state().query, "Berlin");

        // the older answer arrives late and changes nothing
        older.send(Ok(ranchi_details())).unwrap();
        assert_eq!(first.await.unwrap(), Ok(ranchi()));
        assert_eq!(search.state().query, "Berlin");
        assert_eq!(
            events.recv().await.unwrap(),
            SearchEvent::Selected(berlin_details())
        );
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn stale_selection_failure_is_silent() {
        let gw = Arc::new(GatedPlaces::default());
        let search = PlaceSearchSession::new(Arc::clone(&gw));
        let mut events = search.events();
        let older = gw.gate_details();
        let newer = gw.gate_details();

        let first = tokio::spawn({
            let search = search.clone();
            async move { search.on_prediction_selected("p1").await }
        });
        while gw.details_call_count() < 1 {
            tokio::task::yield_now().await;
        }
        let second = tokio::spawn({
            let search = search.clone();
            async move { search.on_prediction_selected("p2").await }
        });
        while gw.details_call_count() < 2 {
            tokio::task::yield_now().await;
        }

        newer.send(Ok(berlin_details())).unwrap();
        second.await.unwrap().unwrap();
        older.send(Err("timeout".to_string())).unwrap();
        assert!(first.await.unwrap().is_err());
        assert_eq!(search.state().query, "Berlin");
        assert_eq!(
            events.recv().await.unwrap(),
            SearchEvent::Selected(berlin_details())
        );
        assert!(events.try_recv().is_err());
    }
}

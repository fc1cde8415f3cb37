//! Dashboard state and event loop.
//!
//! One user action (search or locate) fans out into concurrent fetch tasks;
//! their results come back over a channel and are applied between frames.
//! Each display region keeps a sequence number so a slow response from an
//! older action can never overwrite a newer one.

use anyhow::Context;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use skydash_core::model::Coord;
use skydash_core::view::{ForecastView, ReadingView, StatusLine};
use skydash_core::{
    Backend, BackendError, ForecastPayload, HttpBackend, LocationError, LocationQuery,
    WeatherPayload,
};

const TICK: Duration = Duration::from_millis(50);

/// Results delivered back to the event loop by spawned tasks. Fetch results
/// carry the sequence stamp of the action that spawned them.
#[derive(Debug)]
pub enum Msg {
    Weather(u64, Result<WeatherPayload, BackendError>),
    Forecast(u64, Result<ForecastPayload, BackendError>),
    Located(Result<Coord, LocationError>),
}

/// All dashboard state, built once at startup and handed to the render
/// functions every frame.
pub struct App {
    pub input: String,
    pub status: StatusLine,
    pub reading: Option<ReadingView>,
    pub forecast: Option<ForecastView>,
    pub should_quit: bool,
    backend: Arc<dyn Backend>,
    tx: mpsc::UnboundedSender<Msg>,
    weather_seq: u64,
    forecast_seq: u64,
}

impl App {
    pub fn new(backend: Arc<dyn Backend>, tx: mpsc::UnboundedSender<Msg>) -> Self {
        Self {
            input: String::new(),
            status: StatusLine::idle(),
            reading: None,
            forecast: None,
            should_quit: false,
            backend,
            tx,
            weather_seq: 0,
            forecast_seq: 0,
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') | KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('l') => self.locate(),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Enter => self.search(),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) => self.input.push(c),
            _ => {}
        }
    }

    /// Search action: fetch weather and forecast for the typed city,
    /// concurrently and without any ordering between them.
    pub fn search(&mut self) {
        let city = self.input.trim().to_string();
        if city.is_empty() {
            self.status = StatusLine::empty_city();
            return;
        }
        self.fetch_both(LocationQuery::City(city));
    }

    /// Locate action: resolve coordinates first, then fetch both variants.
    pub fn locate(&mut self) {
        self.status = StatusLine::locating();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(Msg::Located(skydash_core::locate().await));
        });
    }

    fn fetch_both(&mut self, query: LocationQuery) {
        self.spawn_weather(query.clone());
        self.spawn_forecast(query);
    }

    fn spawn_weather(&mut self, query: LocationQuery) {
        self.status = StatusLine::loading();
        self.weather_seq += 1;
        let seq = self.weather_seq;
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(Msg::Weather(seq, backend.current_weather(&query).await));
        });
    }

    fn spawn_forecast(&mut self, query: LocationQuery) {
        self.status = StatusLine::loading_forecast();
        self.forecast_seq += 1;
        let seq = self.forecast_seq;
        let backend = Arc::clone(&self.backend);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(Msg::Forecast(seq, backend.forecast(&query).await));
        });
    }

    /// Apply one task result. Stale results (an action has been triggered
    /// since theirs) are dropped without touching any state.
    pub fn apply(&mut self, msg: Msg) {
        match msg {
            Msg::Weather(seq, result) => {
                if seq != self.weather_seq {
                    tracing::debug!(seq, latest = self.weather_seq, "dropping stale weather");
                    return;
                }
                match result {
                    Ok(payload) => {
                        self.status = StatusLine::loaded(payload.cached);
                        self.reading = Some(ReadingView::from(&payload.data));
                    }
                    Err(err) => {
                        tracing::warn!(%err, "weather request failed");
                        self.status = StatusLine::fetch_error(&err.to_string());
                    }
                }
            }
            Msg::Forecast(seq, result) => {
                if seq != self.forecast_seq {
                    tracing::debug!(seq, latest = self.forecast_seq, "dropping stale forecast");
                    return;
                }
                match result {
                    Ok(payload) => {
                        self.status = StatusLine::forecast_loaded();
                        // An empty list hides the section.
                        self.forecast = ForecastView::from_days(&payload.data);
                    }
                    Err(err) => {
                        tracing::warn!(%err, "forecast request failed");
                        self.status = StatusLine::forecast_error(&err.to_string());
                    }
                }
            }
            Msg::Located(result) => match result {
                Ok(coord) => {
                    self.fetch_both(LocationQuery::Coords { lat: coord.lat, lon: coord.lon });
                }
                Err(err) => {
                    tracing::warn!(%err, "location lookup failed");
                    self.status = StatusLine::location_error(&err.to_string());
                }
            },
        }
    }
}

/// Run the dashboard against `base_url` until the user quits.
pub async fn run_dashboard(base_url: String) -> anyhow::Result<()> {
    let backend: Arc<dyn Backend> = Arc::new(HttpBackend::new(base_url));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut app = App::new(backend, tx);

    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, &mut app, &mut rx).await;
    restore_terminal(&mut terminal)?;
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    rx: &mut mpsc::UnboundedReceiver<Msg>,
) -> anyhow::Result<()> {
    loop {
        terminal.draw(|frame| crate::ui::render(frame, app))?;

        while let Ok(msg) = rx.try_recv() {
            app.apply(msg);
        }

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("Failed to create terminal")
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> anyhow::Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to restore cursor")
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use async_trait::async_trait;
    use skydash_core::WeatherReading;
    use skydash_core::model::{ConditionInfo, MainReadings, Wind};

    /// Backend whose responses are fixed up front.
    #[derive(Debug, Default)]
    pub struct FakeBackend {
        pub weather: Option<WeatherPayload>,
        pub forecast: Option<ForecastPayload>,
    }

    #[async_trait]
    impl Backend for FakeBackend {
        async fn current_weather(
            &self,
            _query: &LocationQuery,
        ) -> Result<WeatherPayload, BackendError> {
            self.weather.clone().ok_or(BackendError::Api {
                status: 500,
                message: "no canned weather".to_string(),
            })
        }

        async fn forecast(&self, _query: &LocationQuery) -> Result<ForecastPayload, BackendError> {
            self.forecast.clone().ok_or(BackendError::Api {
                status: 500,
                message: "no canned forecast".to_string(),
            })
        }
    }

    pub fn test_app() -> (App, mpsc::UnboundedReceiver<Msg>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (App::new(Arc::new(FakeBackend::default()), tx), rx)
    }

    pub fn paris_payload(cached: bool) -> WeatherPayload {
        let data = WeatherReading {
            name: Some("Paris".to_string()),
            coord: Some(Coord { lat: 48.85, lon: 2.35 }),
            weather: vec![ConditionInfo {
                description: "clear sky".to_string(),
                icon: Some("01d".to_string()),
            }],
            main: Some(MainReadings { temp: 18.0, humidity: 60 }),
            wind: Some(Wind { speed: 3.0 }),
        };
        WeatherPayload { cached, data }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use skydash_core::ForecastDay;
    use skydash_core::view::StatusKind;

    fn day(date: &str) -> ForecastDay {
        ForecastDay {
            date: date.parse().expect("valid date"),
            temp_avg: Some(12.0),
            temp_min: Some(9.0),
            temp_max: Some(15.0),
            icon: Some("10d".to_string()),
            description: Some("light rain".to_string()),
        }
    }

    #[tokio::test]
    async fn empty_input_search_is_rejected_without_fetching() {
        let (mut app, mut rx) = test_app();
        app.input = "   ".to_string();

        app.search();

        assert_eq!(app.status, StatusLine::empty_city());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn search_spawns_weather_and_forecast() {
        let (mut app, mut rx) = test_app();
        app.input = "Paris".to_string();

        app.search();
        // Both tasks must eventually report back.
        let first = rx.recv().await.expect("first result");
        let second = rx.recv().await.expect("second result");

        let mut kinds = [&first, &second]
            .iter()
            .map(|m| match m {
                Msg::Weather(..) => "weather",
                Msg::Forecast(..) => "forecast",
                Msg::Located(..) => "located",
            })
            .collect::<Vec<_>>();
        kinds.sort_unstable();
        assert_eq!(kinds, ["forecast", "weather"]);
        assert_eq!(app.status, StatusLine::loading_forecast());
    }

    #[tokio::test]
    async fn weather_success_updates_status_and_reading() {
        let (mut app, _rx) = test_app();
        app.input = "Paris".to_string();
        app.search();

        app.apply(Msg::Weather(1, Ok(paris_payload(false))));

        assert_eq!(app.status, StatusLine::loaded(false));
        let reading = app.reading.as_ref().expect("reading set");
        assert_eq!(reading.temperature, "18 °C");
    }

    #[tokio::test]
    async fn cached_weather_says_so() {
        let (mut app, _rx) = test_app();
        app.input = "Paris".to_string();
        app.search();

        app.apply(Msg::Weather(1, Ok(paris_payload(true))));

        assert_eq!(app.status.text, "Loaded (cached)");
    }

    #[tokio::test]
    async fn stale_weather_response_is_dropped() {
        let (mut app, _rx) = test_app();
        app.input = "Paris".to_string();
        app.search();
        app.input = "London".to_string();
        app.search();

        // The response for the first search arrives after the second one
        // was triggered; it must not touch the dashboard.
        app.apply(Msg::Weather(1, Ok(paris_payload(false))));
        assert!(app.reading.is_none());
        assert_eq!(app.status, StatusLine::loading_forecast());

        app.apply(Msg::Weather(2, Ok(paris_payload(false))));
        assert!(app.reading.is_some());
    }

    #[tokio::test]
    async fn stale_forecast_response_is_dropped() {
        let (mut app, _rx) = test_app();
        app.input = "Paris".to_string();
        app.search();
        app.search();

        app.apply(Msg::Forecast(
            1,
            Ok(ForecastPayload { cached: false, data: vec![day("2025-10-18")] }),
        ));

        assert!(app.forecast.is_none());
    }

    #[tokio::test]
    async fn weather_error_keeps_previous_reading() {
        let (mut app, _rx) = test_app();
        app.input = "Paris".to_string();
        app.search();
        app.apply(Msg::Weather(1, Ok(paris_payload(false))));

        app.input = "Atlantis".to_string();
        app.search();
        app.apply(Msg::Weather(
            2,
            Err(BackendError::Api { status: 404, message: "city not found".to_string() }),
        ));

        assert_eq!(app.status.text, "Error: city not found");
        assert_eq!(app.status.kind, StatusKind::Error);
        // Prior dashboard content stays in place.
        assert!(app.reading.is_some());
    }

    #[tokio::test]
    async fn empty_forecast_hides_the_section() {
        let (mut app, _rx) = test_app();
        app.input = "Paris".to_string();
        app.search();
        app.apply(Msg::Forecast(
            1,
            Ok(ForecastPayload { cached: false, data: vec![day("2025-10-18")] }),
        ));
        assert!(app.forecast.is_some());

        app.search();
        app.apply(Msg::Forecast(2, Ok(ForecastPayload { cached: false, data: vec![] })));

        assert!(app.forecast.is_none());
        assert_eq!(app.status, StatusLine::forecast_loaded());
    }

    #[tokio::test]
    async fn forecast_error_keeps_previous_cards() {
        let (mut app, _rx) = test_app();
        app.input = "Paris".to_string();
        app.search();
        app.apply(Msg::Forecast(
            1,
            Ok(ForecastPayload { cached: false, data: vec![day("2025-10-18")] }),
        ));

        app.search();
        app.apply(Msg::Forecast(
            2,
            Err(BackendError::Api { status: 502, message: "upstream down".to_string() }),
        ));

        assert_eq!(app.status.text, "Forecast error: upstream down");
        assert!(app.forecast.is_some());
    }

    #[tokio::test]
    async fn location_failure_is_a_status_not_a_crash() {
        let (mut app, mut rx) = test_app();

        app.apply(Msg::Located(Err(LocationError::Unavailable)));

        assert_eq!(app.status.text, "Geolocation error: location service unavailable");
        assert_eq!(app.status.kind, StatusKind::Error);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn located_coordinates_trigger_both_fetches() {
        let (mut app, mut rx) = test_app();

        app.apply(Msg::Located(Ok(Coord { lat: 48.85, lon: 2.35 })));

        let _ = rx.recv().await.expect("weather result");
        let _ = rx.recv().await.expect("forecast result");
        assert_eq!(app.status, StatusLine::loading_forecast());
    }

    #[tokio::test]
    async fn typing_builds_the_input_and_esc_quits() {
        let (mut app, _rx) = test_app();

        for c in "Oslo".chars() {
            app.on_key(KeyEvent::from(KeyCode::Char(c)));
        }
        assert_eq!(app.input, "Oslo");

        app.on_key(KeyEvent::from(KeyCode::Backspace));
        assert_eq!(app.input, "Osl");

        app.on_key(KeyEvent::from(KeyCode::Esc));
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn ctrl_c_quits() {
        let (mut app, _rx) = test_app();

        app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));

        assert!(app.should_quit);
    }
}

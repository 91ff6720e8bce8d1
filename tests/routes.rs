mod common;

use std::sync::Arc;

use serde_json::Value;
use warp::http::StatusCode;

use common::{dashboard_over, FakeMarket};
use stock_forecast_dashboard::config::Settings;
use stock_forecast_dashboard::handlers::AppState;
use stock_forecast_dashboard::routes::routes;

fn app(market: Arc<FakeMarket>) -> Arc<AppState> {
    let settings = Settings::default();
    AppState::new(dashboard_over(market), settings.form_defaults())
}

fn json(body: &[u8]) -> Value {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn forecast_reports_each_ticker() {
    let filter = routes(app(Arc::new(FakeMarket::with_unknown(&["AAPL"]))));
    let res = warp::test::request()
        .method("GET")
        .path("/api/v1/forecast?tickers=goog,,AAPL&years=2")
        .reply(&filter)
        .await;

    assert_eq!(res.status(), StatusCode::OK);
    let body = json(res.body());
    assert_eq!(body["years"], 2);
    assert_eq!(body["horizon_days"], 730);
    assert_eq!(body["results"][0]["symbol"], "GOOG");
    assert_eq!(body["results"][0]["status"], "ok");
    assert_eq!(
        body["results"][0]["report"]["raw_chart"]["title"],
        "Time Series data for GOOG"
    );
    assert_eq!(body["results"][1]["status"], "error");
    assert_eq!(body["results"][1]["error"], "unknown ticker symbol 'AAPL'");
}

#[tokio::test]
async fn out_of_range_years_is_a_bad_request() {
    let market = Arc::new(FakeMarket::default());
    let filter = routes(app(market.clone()));
    let res = warp::test::request()
        .path("/api/v1/forecast?tickers=GOOG&years=9")
        .reply(&filter)
        .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert!(json(res.body())["error"].as_str().unwrap().contains("9 years"));
    assert_eq!(market.calls(), 0);
}

#[tokio::test]
async fn blank_ticker_list_is_a_bad_request() {
    let filter = routes(app(Arc::new(FakeMarket::default())));
    let res = warp::test::request()
        .path("/api/v1/forecast?tickers=%20,%20&years=1")
        .reply(&filter)
        .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(res.body())["error"], "no ticker symbols supplied");
}

#[tokio::test]
async fn malformed_query_is_a_bad_request() {
    let filter = routes(app(Arc::new(FakeMarket::default())));
    let res = warp::test::request()
        .path("/api/v1/forecast?years=two")
        .reply(&filter)
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn defaults_describe_the_form() {
    let filter = routes(app(Arc::new(FakeMarket::default())));
    let res = warp::test::request().path("/api/v1/defaults").reply(&filter).await;

    assert_eq!(res.status(), StatusCode::OK);
    let body = json(res.body());
    assert_eq!(body["tickers"], "GOOG, AAPL, MSFT, GME");
    assert_eq!(body["min_years"], 1);
    assert_eq!(body["max_years"], 5);
    assert_eq!(body["start_date"], "2012-01-01");
}

#[tokio::test]
async fn unknown_paths_are_json_404s() {
    let filter = routes(app(Arc::new(FakeMarket::default())));
    let res = warp::test::request().path("/api/v1/nope").reply(&filter).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(json(res.body())["error"], "Not Found");
}

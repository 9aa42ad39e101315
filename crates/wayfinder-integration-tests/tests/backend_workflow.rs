//! Seed, discover and route against the mock backend over real HTTP.

use serde_json::json;
use wayfinder_client::{
    Error, FinderPhase, GraphKind, HttpRouteRepository, RouteFinder, RouteRepository,
};
use wayfinder_integration_tests::{route_payload, MockBackend, RouteReply};
use wayfinder_model::{Algorithm, NodeId};

fn three_nodes() -> serde_json::Value {
    json!([
        {"id": 1, "lat": 40.4168, "lng": -3.7038, "name": "Sol", "congestionLevel": 10},
        {"id": 2, "lat": 40.4200, "lng": -3.7000, "congestionLevel": 45},
        {"id": 3, "lat": 40.4250, "lng": -3.6950, "isBlocked": false}
    ])
}

fn two_three_route() -> RouteReply {
    RouteReply::Json(route_payload(
        "dijkstra",
        &[(2, 40.4200, -3.7000), (3, 40.4250, -3.6950)],
        500.0,
        60.0,
    ))
}

#[tokio::test]
async fn seeding_skips_disconnected_pair() {
    wayfinder_logging::init_for_tests();
    let backend = MockBackend::new()
        .with_nodes(three_nodes())
        .with_route("2", "3", two_three_route())
        .spawn()
        .await
        .unwrap();
    let finder = RouteFinder::new(HttpRouteRepository::new(&backend.config()).unwrap());

    let pair = finder.seed_graph(GraphKind::Simple).await.unwrap();
    assert_eq!(pair.start, NodeId::from(2));
    assert_eq!(pair.end, NodeId::from(3));

    let snapshot = finder.snapshot().await;
    assert_eq!(snapshot.phase, FinderPhase::Seeded);
    assert_eq!(snapshot.nodes.len(), 3);
    assert_eq!(snapshot.nodes[0].name, "Sol");
    assert_eq!(snapshot.nodes[1].name, "Node 2");

    let route = finder.find_route_auto(Algorithm::Dijkstra).await.unwrap();
    assert_eq!(route.formatted_distance(), "500 m");
    assert_eq!(route.formatted_time(), "1m 0s");
    assert_eq!(route.exploration_steps()[0].node, NodeId::from(2));

    assert_eq!(
        backend.requests(),
        vec![
            "POST /graph/seed?kind=simple",
            "GET /graph/nodes",
            "GET /route?start=1&end=2&algorithm=dijkstra",
            "GET /route?start=2&end=3&algorithm=dijkstra",
            "GET /route?start=2&end=3&algorithm=dijkstra",
        ]
    );
}

#[tokio::test]
async fn single_path_node_is_invalid_even_on_success() {
    let backend = MockBackend::new()
        .with_route(
            "1",
            "3",
            RouteReply::Json(route_payload("dijkstra", &[(1, 40.0, -3.0)], 100.0, 10.0)),
        )
        .spawn()
        .await
        .unwrap();
    let repo = HttpRouteRepository::new(&backend.config()).unwrap();

    let err = repo
        .find_route(&NodeId::from(1), &NodeId::from(3), Algorithm::Dijkstra)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidRouteData(_)), "got {err:?}");
}

#[tokio::test]
async fn empty_path_and_missing_route_mean_no_path() {
    let backend = MockBackend::new()
        .with_route(
            "1",
            "2",
            RouteReply::Json(json!({
                "algorithm": "dijkstra",
                "explorationSteps": [],
                "nodeDetails": [],
                "totalDistance": 0,
                "totalTime": 0
            })),
        )
        .spawn()
        .await
        .unwrap();
    let repo = HttpRouteRepository::new(&backend.config()).unwrap();

    for (start, end) in [(1u64, 2u64), (5, 6)] {
        let err = repo
            .find_route(&NodeId::from(start), &NodeId::from(end), Algorithm::AStar)
            .await
            .unwrap_err();
        match err {
            Error::NoPathFound { start: s, end: e } => {
                assert_eq!((s, e), (NodeId::from(start), NodeId::from(end)));
            }
            other => panic!("expected NoPathFound, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn server_errors_carry_status_and_message() {
    let backend = MockBackend::new()
        .with_route("1", "2", RouteReply::Status(500, "graph not built".to_string()))
        .spawn()
        .await
        .unwrap();
    let repo = HttpRouteRepository::new(&backend.config()).unwrap();

    let err = repo
        .find_route(&NodeId::from(1), &NodeId::from(2), Algorithm::Dijkstra)
        .await
        .unwrap_err();
    match &err {
        Error::Backend { status, message } => {
            assert_eq!(*status, 500);
            assert_eq!(message, "graph not built");
        }
        other => panic!("expected Backend, got {other:?}"),
    }
    assert!(err.is_retryable());
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let closed = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = closed.local_addr().unwrap();
    drop(closed);

    let config = wayfinder_client::ClientConfig::with_base_url(format!("http://{addr}/api"));
    let repo = HttpRouteRepository::new(&config).unwrap();

    let err = repo.graph_nodes().await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "got {err:?}");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn malformed_nodes_are_rejected() {
    let backend = MockBackend::new()
        .with_nodes(json!([{"id": 1, "lat": 95.0, "lng": 0.0}]))
        .spawn()
        .await
        .unwrap();
    let finder = RouteFinder::new(HttpRouteRepository::new(&backend.config()).unwrap());

    let err = finder.seed_graph(GraphKind::Enhanced).await.unwrap_err();
    assert!(matches!(err, Error::InvalidGraphData(_)), "got {err:?}");
    assert_eq!(backend.requests()[0], "POST /graph/seed?kind=enhanced");

    let snapshot = finder.snapshot().await;
    assert_eq!(snapshot.phase, FinderPhase::Error);
    assert!(snapshot.error.is_some());
}

#[tokio::test]
async fn path_order_survives_the_wire() {
    let path = [(2, 40.42, -3.70), (5, 40.43, -3.69), (3, 40.44, -3.68)];
    let backend = MockBackend::new()
        .with_route(
            "2",
            "3",
            RouteReply::Json(route_payload("astar", &path, 1500.0, 3725.0)),
        )
        .spawn()
        .await
        .unwrap();
    let repo = HttpRouteRepository::new(&backend.config()).unwrap();

    let route = repo
        .find_route(&NodeId::from(2), &NodeId::from(3), Algorithm::AStar)
        .await
        .unwrap();

    let ids: Vec<&str> = route.path().into_iter().map(NodeId::as_str).collect();
    assert_eq!(ids, vec!["2", "5", "3"]);
    assert_eq!(route.algorithm(), Algorithm::AStar);
    assert_eq!(route.formatted_distance(), "1.5 km");
    assert_eq!(route.formatted_time(), "1h 2m");
    assert_eq!(route.path_coordinates().len(), 3);
}

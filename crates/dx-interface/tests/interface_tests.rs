//! DxInterface tests: a recording fake for address translation, and the
//! in-memory service for the combined query/write/exec flow.

use std::sync::Mutex;

use async_trait::async_trait;
use dx_client::{ArrayService, DxClient};
use dx_common::{ArrayBox, DxError, DxResult, ExecArg, Extent, NDArray, ObjectRef};
use dx_interface::{
    CatalogRequest, DxInterface, GeoBounds, LocalRequest, SemanticRequest, SourceConfig,
};
use dx_protocol::{ExecOutput, ExecUnit, Expr};
use test_utils::fixtures::{dates, geo, names};
use test_utils::{create_constant_grid, create_temperature_grid, MockDataService};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Get(ObjectRef, ArrayBox),
    Put(ObjectRef, Vec<i64>, Vec<usize>),
    Exec(usize),
}

#[derive(Default)]
struct RecordingService {
    calls: Mutex<Vec<Call>>,
}

impl RecordingService {
    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArrayService for RecordingService {
    async fn get_array(&self, object: &ObjectRef, region: &ArrayBox) -> DxResult<Option<NDArray>> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Get(object.clone(), region.clone()));
        Ok(None)
    }

    async fn put_array(&self, object: &ObjectRef, offset: &[i64], data: &NDArray) -> DxResult<()> {
        self.calls.lock().unwrap().push(Call::Put(
            object.clone(),
            offset.to_vec(),
            data.shape().to_vec(),
        ));
        Ok(())
    }

    async fn exec(&self, _unit: &ExecUnit, args: &[ExecArg]) -> DxResult<Option<ExecOutput>> {
        self.calls.lock().unwrap().push(Call::Exec(args.len()));
        Ok(None)
    }
}

fn mid_atlantic() -> GeoBounds {
    GeoBounds::new(geo::MID_ATLANTIC.0, geo::MID_ATLANTIC.1)
}

fn catalog(variable: &str) -> SemanticRequest {
    SemanticRequest::PlanetaryGddp(CatalogRequest {
        variable: variable.to_string(),
        start_date: dates::SINGLE_DAY.0.to_string(),
        end_date: dates::SINGLE_DAY.1.to_string(),
        model: Some("ACCESS-ESM1-5".to_string()),
        scenario: None,
        geo: mid_atlantic(),
    })
}

fn local_pressure() -> SemanticRequest {
    SemanticRequest::Local(LocalRequest {
        variable: "pressure".to_string(),
        model: "mymodel".to_string(),
        geo: mid_atlantic(),
    })
}

// ============================================================================
// Address translation
// ============================================================================

#[tokio::test]
async fn test_query_translates_catalog_request() {
    let dx = DxInterface::new(RecordingService::default(), SourceConfig::default());
    let result = dx.query(&catalog("tas")).await.unwrap();
    assert!(result.is_none());

    let ((lat0, lon0), (lat1, lon1)) = geo::MID_ATLANTIC_INDICES;
    assert_eq!(
        dx.service().calls(),
        vec![Call::Get(
            ObjectRef::new(names::TAS_ACCESS, dates::SINGLE_DAY_VERSION)
                .in_namespace(names::CATALOG_NAMESPACE),
            ArrayBox::from_bounds(&[lat0, lon0], &[lat1, lon1]).unwrap(),
        )]
    );
}

#[tokio::test]
async fn test_write_uses_version_zero_at_origin() {
    let dx = DxInterface::new(RecordingService::default(), SourceConfig::default());
    dx.write("pressure", "mymodel", &create_constant_grid(1440, 600, 101_000.0))
        .await
        .unwrap();

    assert_eq!(
        dx.service().calls(),
        vec![Call::Put(
            ObjectRef::new(names::LOCAL_PRESSURE, 0),
            vec![0, 0],
            vec![600, 1440],
        )]
    );
}

#[tokio::test]
async fn test_write_requires_model_and_variable() {
    let dx = DxInterface::new(RecordingService::default(), SourceConfig::default());
    let grid = create_constant_grid(4, 2, 0.0);

    for (variable, model) in [("pressure", ""), ("pressure", "  "), ("", "mymodel")] {
        let err = dx.write(variable, model, &grid).await.unwrap_err();
        assert!(matches!(err, DxError::Config(_)), "{:?}", err);
        assert!(err.is_local());
    }
    assert!(dx.service().calls().is_empty());
}

#[tokio::test]
async fn test_query_whole_grid() {
    let dx = DxInterface::new(RecordingService::default(), SourceConfig::default());
    let mut request = catalog("tas");
    if let SemanticRequest::PlanetaryGddp(r) = &mut request {
        r.geo = GeoBounds::new(geo::GLOBAL.0, geo::GLOBAL.1);
    }
    dx.query(&request).await.unwrap();

    let calls = dx.service().calls();
    let [Call::Get(object, region)] = calls.as_slice() else {
        panic!("expected one read, got {:?}", calls);
    };
    assert_eq!(object.version >> 16, u32::from(dates::SINGLE_DAY_START_DAYS));
    assert_eq!(region.bounds, vec![Extent::new(0, 600), Extent::new(0, 1440)]);
}

#[tokio::test]
async fn test_invalid_requests_never_reach_the_service() {
    let dx = DxInterface::new(RecordingService::default(), SourceConfig::default());

    let mut inverted = catalog("tas");
    if let SemanticRequest::PlanetaryGddp(r) = &mut inverted {
        r.start_date = dates::INVERTED.0.to_string();
        r.end_date = dates::INVERTED.1.to_string();
    }
    assert!(matches!(
        dx.query(&inverted).await,
        Err(DxError::InvertedDateRange { .. })
    ));

    let mut outside = catalog("tas");
    if let SemanticRequest::PlanetaryGddp(r) = &mut outside {
        r.geo = GeoBounds::new((-75.0, 0.0), (10.0, 10.0));
    }
    assert!(matches!(
        dx.query(&outside).await,
        Err(DxError::CoordinateOutOfRange(_))
    ));

    let unknown_model = SemanticRequest::Local(LocalRequest {
        variable: "pressure".to_string(),
        model: "elsewhere".to_string(),
        geo: mid_atlantic(),
    });
    assert!(matches!(dx.build_arg(&unknown_model), Err(DxError::Config(_))));

    assert!(dx.service().calls().is_empty());
}

#[tokio::test]
async fn test_configured_catalog_namespace() {
    let sources = SourceConfig {
        catalog_namespace: "cmip6-mirror".to_string(),
        ..SourceConfig::default()
    };
    let dx = DxInterface::new(RecordingService::default(), sources);
    let arg = dx.build_arg(&catalog("huss")).unwrap();
    assert_eq!(arg.object.namespace.as_deref(), Some("cmip6-mirror"));
    assert_eq!(arg.object.name, names::HUSS_ACCESS);
}

// ============================================================================
// Against the in-memory service
// ============================================================================

#[tokio::test]
async fn test_heat_index_style_flow() {
    let service = MockDataService::start().await;
    let dx = DxInterface::new(
        DxClient::connect(&service.base_url()).unwrap(),
        SourceConfig::default(),
    );

    // Catalog holdings cover the whole grid for the requested day.
    let tas = create_temperature_grid(1440, 600);
    service.insert(
        names::TAS_ACCESS,
        dates::SINGLE_DAY_VERSION,
        Some(names::CATALOG_NAMESPACE),
        &[0, 0],
        &tas,
    );
    dx.write("pressure", "mymodel", &create_constant_grid(1440, 600, 1000.0))
        .await
        .unwrap();

    let window = dx.query(&catalog("tas")).await.unwrap().unwrap();
    assert_eq!(window.shape(), &[8, 13]);

    let args = vec![
        dx.build_arg(&catalog("tas")).unwrap(),
        dx.build_arg(&local_pressure()).unwrap(),
    ];
    assert_eq!(args[0].region.bounds, vec![Extent::new(395, 8), Extent::new(412, 13)]);

    let unit = ExecUnit::expr(Expr::arg(0) - Expr::arg(1) / 100.0);
    let result = dx.exec(&unit, &args).await.unwrap().unwrap();
    let result = result.into_array().unwrap();
    assert_eq!(result.shape(), &[8, 13]);

    let expected: Vec<f64> = window.to_f64_vec().into_iter().map(|t| t - 10.0).collect();
    let actual = result.to_vec::<f64>().unwrap();
    for (a, e) in actual.iter().zip(&expected) {
        assert!((a - e).abs() < 1e-9);
    }

    // huss was never stored.
    let missing = vec![dx.build_arg(&catalog("huss")).unwrap()];
    assert!(dx.exec(&ExecUnit::expr(Expr::arg(0)), &missing).await.unwrap().is_none());
}

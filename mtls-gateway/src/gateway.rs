use cert_validation::{
    CertValidationConfig, CertValidationService, IssuerResolver, RevocationGuard, TppValidationService,
    TrustStore, ValidatorRegistry,
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::context::{RequestContext, ResponseContext};
use crate::enforcement::MtlsEnforcementExecutor;
use crate::executor::GatewayExecutor;
use crate::revocation::CertRevocationValidationExecutor;
use crate::tpp::TppValidationExecutor;

/// The assembled mTLS pipeline stages.
///
/// Owns exactly one revocation cache (inside the guard) and one TPP
/// validation cache (inside the service); clones share them.
#[derive(Clone)]
pub struct MtlsGateway {
    service: Arc<CertValidationService>,
    guard: Arc<RevocationGuard>,
    executors: Vec<Arc<dyn GatewayExecutor>>,
}

impl MtlsGateway {
    pub fn builder(config: CertValidationConfig) -> MtlsGatewayBuilder {
        MtlsGatewayBuilder {
            config,
            issuer_resolver: None,
            registry: ValidatorRegistry::with_defaults(),
            tpp_service: None,
        }
    }

    pub fn service(&self) -> &Arc<CertValidationService> {
        &self.service
    }

    pub fn guard(&self) -> &Arc<RevocationGuard> {
        &self.guard
    }

    /// Enforcement, then revocation, then TPP validation
    pub fn executors(&self) -> &[Arc<dyn GatewayExecutor>] {
        &self.executors
    }

    /// Run every request phase of every executor
    pub async fn process_request(&self, ctx: &mut RequestContext) {
        for executor in &self.executors {
            executor.pre_process_request(ctx).await;
        }
        for executor in &self.executors {
            executor.post_process_request(ctx).await;
        }
    }

    pub async fn process_response(&self, ctx: &mut ResponseContext) {
        for executor in &self.executors {
            executor.pre_process_response(ctx).await;
        }
        for executor in &self.executors {
            executor.post_process_response(ctx).await;
        }
    }
}

pub struct MtlsGatewayBuilder {
    config: CertValidationConfig,
    issuer_resolver: Option<Arc<dyn IssuerResolver>>,
    registry: ValidatorRegistry,
    tpp_service: Option<Arc<dyn TppValidationService>>,
}

impl MtlsGatewayBuilder {
    pub fn trust_store(mut self, trust_store: TrustStore) -> Self {
        self.issuer_resolver = Some(Arc::new(trust_store));
        self
    }

    pub fn issuer_resolver(mut self, resolver: Arc<dyn IssuerResolver>) -> Self {
        self.issuer_resolver = Some(resolver);
        self
    }

    /// Replace the default strategy registry
    pub fn registry(mut self, registry: ValidatorRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn tpp_service(mut self, service: Arc<dyn TppValidationService>) -> Self {
        self.tpp_service = Some(service);
        self
    }

    pub fn build(self) -> MtlsGateway {
        let mut service = CertValidationService::new(self.config.tpp.clone());
        if let Some(tpp_service) = self.tpp_service {
            service = service.with_tpp_service(tpp_service);
        }
        let service = Arc::new(service);

        let issuer_resolver = self.issuer_resolver.unwrap_or_else(|| {
            warn!("No trust store configured; only exempt certificates will pass revocation checks");
            Arc::new(TrustStore::default())
        });
        let guard = Arc::new(RevocationGuard::from_config(
            &self.config.revocation,
            self.registry,
            service.clone(),
            issuer_resolver,
        ));

        let executors: Vec<Arc<dyn GatewayExecutor>> = vec![
            Arc::new(MtlsEnforcementExecutor::new()),
            Arc::new(CertRevocationValidationExecutor::new(guard.clone())),
            Arc::new(TppValidationExecutor::new(service.clone(), &self.config.tpp)),
        ];
        info!(
            executors = ?executors.iter().map(|e| e.name()).collect::<Vec<_>>(),
            "mTLS gateway assembled"
        );

        MtlsGateway {
            service,
            guard,
            executors,
        }
    }
}

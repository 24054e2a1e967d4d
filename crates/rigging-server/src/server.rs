//! API server: binding, routing and lifecycle
//!
//! `ApiServer` collects bound services, materializes them into an axum
//! [`Router`] and serves it. Serving consumes the server, so no service can
//! be bound once requests are flowing.

use crate::binder::{bind_service, ActionDescriptor, DescriptorTable};
use crate::config::ServerConfig;
use crate::decoder::{ContentDecoder, StructuredDecoder};
use crate::dispatch::{DispatchSettings, Dispatcher};
use crate::error::{BindError, ServerError};
use crate::middleware;
use crate::responder::{EnvelopeResponder, Responder};
use crate::service::Service;
use axum::extract::Request;
use axum::response::IntoResponse;
use axum::routing::{get, on, MethodFilter, Route};
use axum::{Json, Router};
use rigging_core::Verb;
use std::convert::Infallible;
use std::fmt;
use std::future::{Future, IntoFuture};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tower::{Layer, Service as TowerService};
use tracing::{debug, info, info_span, warn, Instrument, Span};

/// Cross-cutting behavior wrapped around a router
///
/// Interceptors are opaque to the binding engine; they usually wrap a tower
/// layer.
#[derive(Clone)]
pub struct Interceptor(Arc<dyn Fn(Router) -> Router + Send + Sync>);

impl Interceptor {
    /// Wrap the router with a tower layer
    pub fn layer<L>(layer: L) -> Self
    where
        L: Layer<Route> + Clone + Send + Sync + 'static,
        L::Service: TowerService<Request> + Clone + Send + 'static,
        <L::Service as TowerService<Request>>::Response: IntoResponse + 'static,
        <L::Service as TowerService<Request>>::Error: Into<Infallible> + 'static,
        <L::Service as TowerService<Request>>::Future: Send + 'static,
    {
        Self::from_fn(move |router| router.layer(layer.clone()))
    }

    /// Transform the router with an arbitrary function
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(Router) -> Router + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub(crate) fn apply(&self, router: Router) -> Router {
        (self.0)(router)
    }
}

impl fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Interceptor")
    }
}

/// One action queued for registration
struct BoundRoute {
    verb: Verb,
    path: String,
    descriptor: Arc<ActionDescriptor>,
}

/// HTTP server exposing bound services
pub struct ApiServer {
    config: ServerConfig,
    span: Span,
    decoder: Arc<dyn StructuredDecoder>,
    responder: Arc<dyn Responder>,
    routes: Vec<BoundRoute>,
    pre: Vec<Interceptor>,
    post: Vec<Interceptor>,
}

impl ApiServer {
    /// Create a server with the content-type decoder and a span named after the server
    pub fn new(config: ServerConfig) -> Self {
        let span = info_span!("rigging", server = %config.name);
        Self {
            config,
            span,
            decoder: Arc::new(ContentDecoder),
            responder: Arc::new(EnvelopeResponder),
            routes: Vec::new(),
            pre: Vec::new(),
            post: Vec::new(),
        }
    }

    /// Replace the span binding and dispatch are recorded under
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    /// Replace the request body decoder
    pub fn with_decoder(mut self, decoder: impl StructuredDecoder) -> Self {
        self.decoder = Arc::new(decoder);
        self
    }

    /// Replace how method replies are rendered
    pub fn with_responder(mut self, responder: impl Responder) -> Self {
        self.responder = Arc::new(responder);
        self
    }

    /// Add an interceptor around the bound actions
    ///
    /// Interceptors run in the order they were added.
    pub fn with_pre_interceptor(mut self, interceptor: Interceptor) -> Self {
        self.pre.push(interceptor);
        self
    }

    /// Add an interceptor around the whole application
    ///
    /// Interceptors run in the order they were added.
    pub fn with_post_interceptor(mut self, interceptor: Interceptor) -> Self {
        self.post.push(interceptor);
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind every valid action of `service`
    ///
    /// Methods that are not valid actions are skipped; the only error is a
    /// service type that cannot carry actions.
    pub fn bind<S: Service>(&mut self, service: Arc<S>) -> Result<Arc<DescriptorTable>, BindError> {
        let _entered = self.span.enter();

        let table = bind_service(service, &self.config.default_version)?;
        for descriptor in table.actions() {
            let verb = descriptor.plan.verb();
            let path = self.config.action_path(table.version(), &descriptor.plan);
            debug!(%verb, %path, method = %descriptor.plan.method, "Bound action");
            self.routes.push(BoundRoute {
                verb,
                path,
                descriptor: Arc::clone(descriptor),
            });
        }

        info!(
            service = table.service(),
            version = table.version(),
            actions = table.len(),
            "Service bound"
        );
        Ok(Arc::new(table))
    }

    /// Every bound action path, in binding order
    pub fn exports(&self) -> Vec<String> {
        self.routes.iter().map(|route| route.path.clone()).collect()
    }

    /// Materialize the bound actions into a router
    ///
    /// # Panics
    ///
    /// Panics if two bound actions share a verb and a path.
    pub fn into_router(self) -> Router {
        let exports = self.exports();
        let exports_path = self.config.exports_path();
        let settings = Arc::new(DispatchSettings {
            decoder: self.decoder,
            responder: self.responder,
            body_limit: self.config.body_limit,
            request_timeout: self.config.request_timeout,
            span: self.span,
        });

        let mut actions = Router::new();
        for route in self.routes {
            let dispatcher = Dispatcher::new(route.descriptor, Arc::clone(&settings));
            actions = actions.route(
                &route.path,
                on(method_filter(route.verb), move |request: Request| async move {
                    dispatcher.dispatch(request).await
                }),
            );
        }
        actions = actions.route(
            &exports_path,
            get(move || async move { Json(exports) }),
        );

        // Applied last to first so the first interceptor added is outermost
        for interceptor in self.pre.iter().rev() {
            actions = interceptor.apply(actions);
        }

        let mut app = Router::new()
            .merge(actions)
            .fallback(middleware::not_found);
        for interceptor in self.post.iter().rev() {
            app = interceptor.apply(app);
        }
        app
    }

    /// Bind the listener and serve in a background task
    pub async fn start(self) -> Result<RunningServer, ServerError> {
        self.config.validate()?;

        let listener = TcpListener::bind(self.config.addr).await?;
        let local_addr = listener.local_addr()?;
        let shutdown_timeout = self.config.shutdown_timeout;
        let span = self.span.clone();
        let router = self.into_router();

        let shutdown = CancellationToken::new();
        let signal = shutdown.clone();
        let handle = tokio::spawn(
            async move {
                axum::serve(listener, router)
                    .with_graceful_shutdown(async move { signal.cancelled().await })
                    .await
            }
            .instrument(span.clone()),
        );

        info!(parent: &span, %local_addr, "Server listening");
        Ok(RunningServer {
            local_addr,
            shutdown,
            handle,
            shutdown_timeout,
        })
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests
    pub async fn serve<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.config.validate()?;

        let listener = TcpListener::bind(self.config.addr).await?;
        let span = self.span.clone();
        info!(parent: &span, addr = %listener.local_addr()?, "Server listening");

        let router = self.into_router();
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .into_future()
            .instrument(span.clone())
            .await?;

        info!(parent: &span, "Server stopped");
        Ok(())
    }
}

fn method_filter(verb: Verb) -> MethodFilter {
    match verb {
        Verb::Get => MethodFilter::GET,
        Verb::Options => MethodFilter::OPTIONS,
        Verb::Post => MethodFilter::POST,
    }
}

/// Handle to a server started with [`ApiServer::start`]
#[derive(Debug)]
pub struct RunningServer {
    local_addr: SocketAddr,
    shutdown: CancellationToken,
    handle: JoinHandle<io::Result<()>>,
    shutdown_timeout: Duration,
}

impl RunningServer {
    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Token that stops the server when cancelled
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stop accepting connections and wait for in-flight requests
    ///
    /// Requests still running after the shutdown timeout are aborted.
    pub async fn stop(self) -> Result<(), ServerError> {
        self.shutdown.cancel();

        let mut handle = self.handle;
        match tokio::time::timeout(self.shutdown_timeout, &mut handle).await {
            Ok(joined) => flatten(joined),
            Err(_) => {
                warn!(
                    timeout = ?self.shutdown_timeout,
                    "Graceful shutdown timed out, aborting server task"
                );
                handle.abort();
                Err(ServerError::ShutdownTimeout(self.shutdown_timeout))
            }
        }
    }

    /// Wait until the server stops on its own or through its token
    pub async fn wait(self) -> Result<(), ServerError> {
        flatten(self.handle.await)
    }
}

fn flatten(joined: Result<io::Result<()>, JoinError>) -> Result<(), ServerError> {
    joined.map_err(|e| ServerError::Task(e.to_string()))??;
    Ok(())
}

/// Resolves on Ctrl-C or, on unix, SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("Shutdown signal received");
}

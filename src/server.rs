use std::net::SocketAddr;
use std::sync::Arc;

use futures::future::FutureExt;
use log::{info, Logger};
use tokio::sync::mpsc;
use warp::{Filter, Rejection, Reply};

use crate::environment::Environment;
use crate::routes::admin::{self, TerminationFunctionWrapper};

/// Where a service listens: the public API and the admin endpoints.
#[derive(Clone, Copy, Debug)]
pub struct Ports {
    pub main: u16,
    pub admin: u16,
}

/// Serves `api` and the admin routes until either Ctrl-C arrives or
/// someone calls `POST /terminate`, then lets both servers drain.
pub async fn run<S, F, R>(environment: Environment<S>, api: F, ports: Ports)
where
    S: Clone + Send + Sync + 'static,
    F: Filter<Extract = (R,), Error = Rejection> + Clone + Send + Sync + 'static,
    R: Reply,
{
    let logger: Arc<Logger> = environment.logger.clone();

    let (termination_sender, mut termination_receiver) = mpsc::channel::<()>(1);

    let terminate: TerminationFunctionWrapper<'static> = Arc::new(move || {
        let termination_sender = termination_sender.clone();

        async move {
            // a closed channel means shutdown is already under way
            let _ = termination_sender.send(()).await;
        }
        .boxed()
    });

    let should_terminate = async move {
        termination_receiver.recv().await;
    }
    .shared();

    let ctrlc = {
        let should_terminate = should_terminate.clone();
        let terminate = terminate.clone();

        let signal = tokio::signal::ctrl_c();

        async move {
            tokio::select! {
                _ = should_terminate => {},
                _ = signal => {
                    terminate().await;
                }
            }
        }
    };

    let main_server = {
        let should_terminate = should_terminate.clone();

        let (address, main_server) = warp::serve(api)
            .bind_with_graceful_shutdown(SocketAddr::from(([0, 0, 0, 0], ports.main)), async {
                should_terminate.await;
            });
        info!(logger, "Listening..."; "address" => %address, "service" => environment.config.service_name());

        main_server
    };

    let admin_server = {
        let should_terminate = should_terminate.clone();

        let routes = admin::make_healthz_route(environment.clone())
            .or(admin::make_termination_route(environment.clone(), terminate));

        let (address, admin_server) = warp::serve(routes)
            .bind_with_graceful_shutdown(SocketAddr::from(([0, 0, 0, 0], ports.admin)), async {
                should_terminate.await;
            });
        info!(logger, "Listening for admin requests..."; "address" => %address);

        admin_server
    };

    tokio::join!(ctrlc, main_server, admin_server);

    info!(logger, "Exiting gracefully...");
}

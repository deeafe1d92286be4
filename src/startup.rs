use std::{net::TcpListener, sync::Arc};

use actix_web::{
    dev::Server,
    middleware::Logger,
    web::{self, Data},
    App, HttpServer,
};

use crate::{
    routes::{
        default_route,
        worker_route::{self, WorkerAuth},
    },
    services::{InFlight, Notifier, SubscriberStore, SweepTrigger},
};

pub fn run(
    listener: TcpListener,
    store: Arc<dyn SubscriberStore>,
    notifier: Arc<dyn Notifier>,
    sweep_trigger: SweepTrigger,
    in_flight: InFlight,
    worker_auth: String,
) -> Result<Server, std::io::Error> {
    let store: Data<dyn SubscriberStore> = Data::from(store);
    let notifier: Data<dyn Notifier> = Data::from(notifier);
    let sweep_trigger = web::Data::new(sweep_trigger);
    let in_flight = web::Data::new(in_flight);
    let worker_auth = web::Data::new(WorkerAuth(worker_auth));

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .service(default_route::default)
            .service(
                web::scope("/api")
                    .service(worker_route::queue_tasks)
                    .service(worker_route::send_ads)
                    .service(worker_route::reset_seen),
            )
            .app_data(store.clone())
            .app_data(notifier.clone())
            .app_data(sweep_trigger.clone())
            .app_data(in_flight.clone())
            .app_data(worker_auth.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

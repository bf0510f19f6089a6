use std::{net::SocketAddr, sync::Arc};

use crate::{
    codec::{Request, Response},
    registry::EquipmentStore,
};

// Executes decoded requests against the equipment store. Every outcome is a response.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    store: Arc<EquipmentStore>,
}

impl Dispatcher {
    pub fn new(store: Arc<EquipmentStore>) -> Self {
        Self { store }
    }

    pub async fn dispatch(&self, request: Request, peer: SocketAddr) -> Response {
        log::info!("Processing {} from {}", request.name(), peer);

        match request {
            Request::GetAll => Response::Registry(self.store.get_all().await),
            Request::Get { id } => match self.store.get(id).await {
                Some(record) => Response::Record(record),
                None => {
                    log::info!("Equipment {} not found (requested by {})", id, peer);
                    Response::NotFound
                }
            },
            Request::Alter { id, status } => match self.store.alter(id, status).await {
                Ok(registry) => Response::Registry(registry),
                Err(error) => Response::Error(error.to_string()),
            },
            Request::ConnectTest => Response::ConnectionOk,
            Request::Ping => Response::Pong,
        }
    }
}

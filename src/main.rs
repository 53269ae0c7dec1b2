use std::error::Error;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Instant;

use feed::{FeedEngineConfig, FeedService, LoadOutcome, TriggerOutcome, Viewport};

mod terminal;
use terminal::TerminalView;

/// Pequeño menú interactivo sobre una lista paginada remota.
///
/// La configuración del endpoint sale de `FEED_API_BASE` y compañía (ver
/// `feed_http::HttpConfig::from_env`). El primer argumento opcional es un
/// ancla (`#id`) que se busca tras la carga inicial.
///
/// Opciones soportadas:
/// 1) Ver items cargados
/// 2) Bajar hasta el final (dispara la sonda de scroll)
/// 3) Publicar item
/// 4) Ir a un ancla
/// 5) Reiniciar
/// 6) Salir
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let collection = Arc::new(feed_http::new_from_env()?);
    let config = FeedEngineConfig::default().with_page_limit(collection.config().page_limit);
    let view = Arc::new(TerminalView::new());
    let service = FeedService::new(collection.clone(),
                                   collection.clone(),
                                   view.clone(),
                                   view.clone(),
                                   view.clone(),
                                   config);

    let fragment = std::env::args().nth(1);
    let report = service.open(fragment.as_deref()).await;
    log::info!("carga inicial: {:?}; ancla: {:?}", report.initial, report.anchor);

    loop {
        println!("\n== Feed CLI menu ==");
        println!("1) Ver items cargados");
        println!("2) Bajar hasta el final");
        println!("3) Publicar item");
        println!("4) Ir a un ancla (#id)");
        println!("5) Reiniciar");
        println!("6) Salir");
        print!("Elige una opción: ");
        io::stdout().flush().ok();

        let mut choice = String::new();
        io::stdin().read_line(&mut choice)?;
        match choice.trim() {
            "1" => {
                view.print_all();
                let st = service.engine().state();
                println!("-- quedan más: {} | cursor: {} --",
                         st.has_more(),
                         st.cursor().map(|c| c.to_query_param()).unwrap_or_else(|| "-".into()));
            }
            "2" => {
                view.scroll_to_bottom();
                let token = service.session();
                match service.triggers().on_scroll(token, view.metrics(), Instant::now()).await {
                    TriggerOutcome::Fired(LoadOutcome::Loaded { rendered, .. }) => println!("{} items nuevos", rendered),
                    TriggerOutcome::Fired(LoadOutcome::Skipped(reason)) => println!("Nada que cargar ({:?})", reason),
                    TriggerOutcome::Fired(LoadOutcome::Failed(e)) => eprintln!("Carga fallida: {}", e),
                    TriggerOutcome::Ignored(reason) => println!("Disparo ignorado ({:?})", reason),
                }
            }
            "3" => {
                let content = prompt("Texto del item: ")?;
                match service.submit(&content).await {
                    Ok(Some(item)) => println!("Item publicado: {}", item.id),
                    Ok(None) => println!("Item publicado"),
                    Err(e) => eprintln!("No se pudo publicar: {}", e),
                }
            }
            "4" => {
                let fragment = prompt("Ancla (#id): ")?;
                let state = service.resolve_anchor(&fragment).await;
                println!("Ancla: {:?}", state);
            }
            "5" => {
                let outcome = service.refresh().await;
                println!("Recarga: {:?}", outcome);
            }
            "6" => {
                println!("Saliendo...");
                break;
            }
            other => {
                println!("Opción inválida: {}", other);
            }
        }
    }

    Ok(())
}

fn prompt(msg: &str) -> io::Result<String> {
    print!("{}", msg);
    io::stdout().flush()?;
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s)
}

use feed::stubs::{InMemoryCollection, RecordingView};
use feed::{FeedEngineConfig, FeedError, FeedService};
use std::sync::Arc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), FeedError> {
    // Colección en memoria y vista que registra lo renderizado
    let repo = Arc::new(InMemoryCollection::numbered("q", 45));
    let view = Arc::new(RecordingView::new(100.0, 600.0));
    let service = FeedService::new(repo.clone(), repo.clone(), view.clone(), view.clone(), view.clone(), FeedEngineConfig::default());

    // Abrir con un ancla que está en la tercera página
    let report = service.open(Some("#q27")).await;
    println!("inicial: {:?}\nancla: {:?}", report.initial, report.anchor);
    println!("renderizados: {} (peticiones: {})\n", view.ids().len(), repo.request_count());

    // Bajar hasta el final y dejar que el centinela pida más
    let token = service.session();
    view.scroll_to_bottom();
    let outcome = service.triggers().on_sentinel(token, 0.0).await;
    println!("centinela: {:?}", outcome);

    // Publicar un item: reinicia la sesión y recarga desde el principio
    let created = service.submit("una frase nueva").await?;
    println!("publicado: {:?}", created);
    println!("primeros ids: {:?}", &view.ids()[..3]);
    Ok(())
}

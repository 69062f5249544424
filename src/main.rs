#[tokio::main]
async fn main() {
    studio_booking_backend::run().await;
}

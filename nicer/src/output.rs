use nicer_core::{Notice, Session};

pub fn print_info(message: &str) {
    println!("[NICER][INFO] {message}");
}

pub fn print_error(message: &str) {
    eprintln!("[NICER][ERROR]: {message}");
}

pub fn print_suggestions(names: &[String]) {
    if names.is_empty() {
        print_info("No matching observations");
    } else {
        print_info("Matching observations:");
        for name in names {
            println!("\t{name}");
        }
    }
}

pub fn print_slots(session: &Session) {
    let slots = session.slots().slots();
    if slots.is_empty() {
        print_info("No plots returned");
        return;
    }
    print_info(&format!(
        "Plots for observation {}:",
        session.slots().obs_id()
    ));
    for slot in slots {
        match slot.max_gti {
            Some(max) => println!("\t{} ({max} GTIs)", slot.id),
            None => println!("\t{} (GTI selection unavailable)", slot.id),
        }
    }
}

pub fn print_gti_selection(indices: &[u32]) {
    let joined = indices
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    print_info(&format!("GTIs: {joined}"));
}

pub fn print_notices(notices: &[&Notice]) {
    for notice in notices.iter().rev() {
        println!("\t{}: {}", notice.title, notice.message);
    }
}
